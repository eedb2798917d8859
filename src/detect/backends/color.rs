use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;
use crate::ClassId;

// Brown/reddish-brown fur in HSV space. Hue in degrees, saturation and
// value normalized to 0..1.
const BROWN_HUE_MAX_DEG: f32 = 40.0;
const MIN_SATURATION: f32 = 0.196;
const MIN_VALUE: f32 = 0.196;

// Blob must cover at least 1% and at most 50% of the frame.
const MIN_AREA_FRACTION: f64 = 0.01;
const MAX_AREA_FRACTION: f64 = 0.5;

// Squirrel silhouettes are roughly 1:1 to 2:1.
const MIN_ASPECT: f64 = 0.5;
const MAX_ASPECT: f64 = 2.5;

/// Heuristic color/shape backend.
///
/// Builds a brown-pixel mask in HSV space, denoises it with a neighborhood
/// vote, extracts the largest connected component, and filters by relative
/// area and aspect ratio. Confidence scales with the blob's share of the
/// frame, with a bonus for near-square silhouettes.
///
/// This backend reports a single implicit class (`squirrel`). Static frames
/// are recognized by content hash and served from the previous result.
pub struct ColorBackend {
    last_hash: Option<[u8; 32]>,
    last_result: Vec<Detection>,
}

impl ColorBackend {
    pub fn new() -> Self {
        Self {
            last_hash: None,
            last_result: Vec::new(),
        }
    }

    fn analyze(&self, frame: &Frame) -> Vec<Detection> {
        let mask = brown_mask(frame);
        let mask = denoise(&mask, frame.width as usize, frame.height as usize);

        let Some(blob) = largest_component(&mask, frame.width as usize, frame.height as usize)
        else {
            return Vec::new();
        };

        let frame_area = frame.width as f64 * frame.height as f64;
        let area_ratio = blob.pixel_count as f64 / frame_area;
        if area_ratio < MIN_AREA_FRACTION || area_ratio > MAX_AREA_FRACTION {
            return Vec::new();
        }

        let bbox = blob.bbox;
        let aspect = bbox.width as f64 / bbox.height as f64;
        if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) {
            return Vec::new();
        }

        let mut confidence = (area_ratio * 10.0).min(1.0);
        if (0.8..=1.5).contains(&aspect) {
            confidence *= 1.2;
        }
        let confidence = confidence.min(1.0) as f32;

        vec![Detection {
            class: ClassId::Squirrel,
            confidence,
            bbox,
        }]
    }
}

impl Default for ColorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for ColorBackend {
    fn name(&self) -> &'static str {
        "color"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let current_hash: [u8; 32] = Sha256::digest(&frame.pixels).into();
        if self.last_hash == Some(current_hash) {
            return Ok(self.last_result.clone());
        }

        let detections = self.analyze(frame);
        self.last_hash = Some(current_hash);
        self.last_result = detections.clone();
        Ok(detections)
    }
}

fn brown_mask(frame: &Frame) -> Vec<bool> {
    frame
        .pixels
        .chunks_exact(3)
        .map(|px| {
            let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
            h <= BROWN_HUE_MAX_DEG && s >= MIN_SATURATION && v >= MIN_VALUE
        })
        .collect()
}

/// Convert an RGB triple to HSV with hue in degrees `[0, 360)` and
/// saturation/value in `[0, 1]`.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    (h, s, v)
}

/// Keep a masked pixel only when at least 4 of its 8 neighbors are masked.
/// Approximates the morphological open/close pass of the original detector:
/// isolated speckles vanish, solid blob interiors and edges survive.
fn denoise(mask: &[bool], width: usize, height: usize) -> Vec<bool> {
    let mut out = vec![false; mask.len()];
    for y in 0..height {
        for x in 0..width {
            if !mask[y * width + x] {
                continue;
            }
            let mut neighbors = 0;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx >= 0
                        && ny >= 0
                        && (nx as usize) < width
                        && (ny as usize) < height
                        && mask[ny as usize * width + nx as usize]
                    {
                        neighbors += 1;
                    }
                }
            }
            if neighbors >= 4 {
                out[y * width + x] = true;
            }
        }
    }
    out
}

struct Blob {
    pixel_count: usize,
    bbox: BoundingBox,
}

/// Largest 8-connected component in the mask, by pixel count.
fn largest_component(mask: &[bool], width: usize, height: usize) -> Option<Blob> {
    let mut visited = vec![false; mask.len()];
    let mut best: Option<Blob> = None;
    let mut stack: Vec<usize> = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }

        let mut count = 0usize;
        let (mut min_x, mut min_y) = (width, height);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        visited[start] = true;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            count += 1;
            let x = idx % width;
            let y = idx / width;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                        continue;
                    }
                    let nidx = ny as usize * width + nx as usize;
                    if mask[nidx] && !visited[nidx] {
                        visited[nidx] = true;
                        stack.push(nidx);
                    }
                }
            }
        }

        if best.as_ref().is_none_or(|b| count > b.pixel_count) {
            best = Some(Blob {
                pixel_count: count,
                bbox: BoundingBox::new(
                    min_x as u32,
                    min_y as u32,
                    (max_x - min_x + 1) as u32,
                    (max_y - min_y + 1) as u32,
                ),
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROWN: (u8, u8, u8) = (139, 69, 19);
    const GREEN: (u8, u8, u8) = (34, 139, 34);

    fn frame_with_rect(
        width: u32,
        height: u32,
        rect: (u32, u32, u32, u32),
        seq: u64,
    ) -> Frame {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let (rx, ry, rw, rh) = rect;
                let inside = x >= rx && x < rx + rw && y >= ry && y < ry + rh;
                let (r, g, b) = if inside { BROWN } else { GREEN };
                pixels.extend_from_slice(&[r, g, b]);
            }
        }
        Frame::new(pixels, width, height, seq).unwrap()
    }

    #[test]
    fn brown_rectangle_is_detected_with_tight_bbox() {
        let mut backend = ColorBackend::new();
        let frame = frame_with_rect(100, 100, (30, 40, 20, 10), 1);

        let detections = backend.detect(&frame).unwrap();
        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!(det.class, ClassId::Squirrel);
        assert_eq!(det.bbox, BoundingBox::new(30, 40, 20, 10));
        assert!(det.confidence > 0.0 && det.confidence <= 1.0);
    }

    #[test]
    fn tiny_blob_is_rejected() {
        let mut backend = ColorBackend::new();
        // 5x5 blob on 100x100 = 0.25% of the frame, under the 1% floor.
        let frame = frame_with_rect(100, 100, (10, 10, 5, 5), 1);
        assert!(backend.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn elongated_blob_is_rejected_by_aspect_ratio() {
        let mut backend = ColorBackend::new();
        // 60x10 = 6:1 aspect, outside the 0.5..2.5 band.
        let frame = frame_with_rect(100, 100, (20, 45, 60, 10), 1);
        assert!(backend.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn repeated_frame_is_served_from_cache() {
        let mut backend = ColorBackend::new();
        let frame = frame_with_rect(100, 100, (30, 40, 20, 10), 1);

        let first = backend.detect(&frame).unwrap();
        let second = backend.detect(&frame).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn hsv_conversion_matches_known_colors() {
        let (h, s, v) = rgb_to_hsv(139, 69, 19);
        assert!((h - 25.0).abs() < 1.0);
        assert!(s > 0.8 && v > 0.5);

        let (h, _, _) = rgb_to_hsv(34, 139, 34);
        assert!((h - 120.0).abs() < 1.0);
    }
}
