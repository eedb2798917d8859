#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;
use crate::ClassId;

const DEFAULT_CANDIDATE_FLOOR: f32 = 0.25;
const NMS_IOU_THRESHOLD: f32 = 0.45;

/// ONNX object-detection backend via tract.
///
/// Loads a YOLO-family model with a square input and a `[1, 4 + classes,
/// anchors]` output layout. Frames are resized to the model input, decoded
/// boxes are scaled back to frame coordinates and deduplicated with
/// per-class non-maximum suppression.
///
/// The candidate floor only prunes model noise; the configured confidence
/// threshold is applied downstream by the decision engine.
pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
    input_size: u32,
    candidate_floor: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_size as usize, input_size as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            candidate_floor: DEFAULT_CANDIDATE_FLOOR,
        })
    }

    /// Override the default candidate floor.
    pub fn with_candidate_floor(mut self, floor: f32) -> Self {
        self.candidate_floor = floor;
        self
    }

    /// Nearest-neighbor resize into the model's NCHW f32 input.
    fn build_input(&self, frame: &Frame) -> Tensor {
        let size = self.input_size as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size, size),
            |(_, channel, y, x)| {
                let src_x = (x as u64 * frame.width as u64 / size as u64) as u32;
                let src_y = (y as u64 * frame.height as u64 / size as u64) as u32;
                let idx = ((src_y * frame.width + src_x) * 3) as usize + channel;
                frame.pixels[idx] as f32 / 255.0
            },
        );
        input.into_tensor()
    }

    fn decode(&self, outputs: TVec<TValue>, frame: &Frame) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let preds = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let shape = preds.shape();
        let expected_rows = 4 + ClassId::ALL.len();
        if shape.len() != 3 || shape[0] != 1 || shape[1] != expected_rows {
            return Err(anyhow!(
                "unexpected model output shape {:?}, expected [1, {}, anchors]",
                shape,
                expected_rows
            ));
        }
        let anchors = shape[2];

        // Decoded boxes are in model-input pixels; scale back to the frame.
        let scale_x = frame.width as f32 / self.input_size as f32;
        let scale_y = frame.height as f32 / self.input_size as f32;

        let mut candidates: Vec<Detection> = Vec::new();
        for a in 0..anchors {
            let mut best_class = ClassId::ALL[0];
            let mut best_score = f32::NEG_INFINITY;
            for (slot, class) in ClassId::ALL.iter().enumerate() {
                let score = preds[[0, 4 + slot, a]];
                if score > best_score {
                    best_score = score;
                    best_class = *class;
                }
            }
            if best_score < self.candidate_floor {
                continue;
            }

            let cx = preds[[0, 0, a]] * scale_x;
            let cy = preds[[0, 1, a]] * scale_y;
            let w = preds[[0, 2, a]] * scale_x;
            let h = preds[[0, 3, a]] * scale_y;

            let Some(bbox) = clip_to_frame(cx, cy, w, h, frame.width, frame.height) else {
                continue;
            };
            candidates.push(Detection {
                class: best_class,
                confidence: best_score.clamp(0.0, 1.0),
                bbox,
            });
        }

        Ok(non_max_suppress(candidates))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.input_size;
        let blank = Frame::new(vec![0u8; (size * size * 3) as usize], size, size, 0)?;
        self.detect(&blank).map(|_| ())
    }
}

fn clip_to_frame(cx: f32, cy: f32, w: f32, h: f32, frame_w: u32, frame_h: u32) -> Option<BoundingBox> {
    let x1 = (cx - w / 2.0).max(0.0);
    let y1 = (cy - h / 2.0).max(0.0);
    let x2 = (cx + w / 2.0).min(frame_w as f32);
    let y2 = (cy + h / 2.0).min(frame_h as f32);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    let width = (x2 - x1).round().max(1.0) as u32;
    let height = (y2 - y1).round().max(1.0) as u32;
    Some(BoundingBox::new(x1.round() as u32, y1.round() as u32, width, height))
}

/// Greedy per-class NMS, highest confidence first.
fn non_max_suppress(mut candidates: Vec<Detection>) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        let overlaps = kept.iter().any(|k| {
            k.class == candidate.class && iou(&k.bbox, &candidate.bbox) > NMS_IOU_THRESHOLD
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ax2 = a.x + a.width;
    let ay2 = a.y + a.height;
    let bx2 = b.x + b.width;
    let by2 = b.y + b.height;

    let ix = ax2.min(bx2).saturating_sub(a.x.max(b.x)) as f32;
    let iy = ay2.min(by2).saturating_sub(a.y.max(b.y)) as f32;
    let intersection = ix * iy;
    let union = (a.area() + b.area()) as f32 - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nms_keeps_highest_confidence_per_cluster() {
        let candidates = vec![
            Detection {
                class: ClassId::Squirrel,
                confidence: 0.6,
                bbox: BoundingBox::new(10, 10, 40, 40),
            },
            Detection {
                class: ClassId::Squirrel,
                confidence: 0.9,
                bbox: BoundingBox::new(12, 12, 40, 40),
            },
            Detection {
                class: ClassId::Raccoon,
                confidence: 0.5,
                bbox: BoundingBox::new(12, 12, 40, 40),
            },
        ];

        let kept = non_max_suppress(candidates);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].class, ClassId::Raccoon);
    }

    #[test]
    fn clip_rejects_degenerate_boxes() {
        // Partially outside: clipped to the frame edge.
        let clipped = clip_to_frame(639.0, 240.0, 10.0, 10.0, 640, 480).unwrap();
        assert_eq!(clipped.x + clipped.width, 640);
        // Fully outside: dropped.
        assert!(clip_to_frame(700.0, 240.0, 4.0, 4.0, 640, 480).is_none());
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = BoundingBox::new(0, 0, 10, 10);
        assert!((iou(&b, &b) - 1.0).abs() < 1e-6);
    }
}
