//! Synthetic frame source.
//!
//! Renders a grassy background with a brown blob sweeping horizontally
//! through the frame center, so the full pipeline (including the heuristic
//! color backend) can be exercised without hardware or model files.

use anyhow::Result;
use rand::Rng;

use crate::frame::Frame;
use crate::ingest::FrameSource;

const BACKGROUND: (u8, u8, u8) = (34, 139, 34);
const BLOB: (u8, u8, u8) = (139, 69, 19);

/// One full left-to-right sweep of the blob, in frames.
const SWEEP_FRAMES: u64 = 100;

#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Stop after this many frames (`None` = endless live source).
    pub frame_limit: Option<u64>,
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    fn render(&self, seq: u64) -> Result<Frame> {
        let width = self.config.width;
        let height = self.config.height;
        let blob_w = (width / 6).max(2);
        let blob_h = (height / 6).max(2);

        // Sweep the blob center across the frame width; pixel jitter keeps
        // consecutive frames from hashing identically.
        let mut rng = rand::thread_rng();
        let progress = (seq % SWEEP_FRAMES) as f64 / SWEEP_FRAMES as f64;
        let cx = (progress * width as f64) as i64 + rng.gen_range(-1..=1);
        let cy = height as i64 / 2 + rng.gen_range(-1..=1);

        let x0 = cx - blob_w as i64 / 2;
        let y0 = cy - blob_h as i64 / 2;

        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height as i64 {
            for x in 0..width as i64 {
                let inside =
                    x >= x0 && x < x0 + blob_w as i64 && y >= y0 && y < y0 + blob_h as i64;
                let (r, g, b) = if inside { BLOB } else { BACKGROUND };
                pixels.extend_from_slice(&[r, g, b]);
            }
        }

        Frame::new(pixels, width, height, seq)
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        log::info!(
            "SyntheticSource: {}x{} scene{}",
            self.config.width,
            self.config.height,
            match self.config.frame_limit {
                Some(limit) => format!(", {} frames", limit),
                None => String::new(),
            }
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(limit) = self.config.frame_limit {
            if self.frame_count >= limit {
                return Ok(None);
            }
        }
        self.frame_count += 1;
        Ok(Some(self.render(self.frame_count)?))
    }
}
