//! Owned frame container.
//!
//! Sources produce `Frame` instances that flow through detection and the
//! decision engine. Pixels are packed RGB24, row-major. Backends receive a
//! shared reference and must not mutate the buffer.

use anyhow::{anyhow, Result};

/// One decoded video frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Packed RGB24 pixel data, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic per-source sequence number, starting at 1.
    pub seq: u64,
}

impl Frame {
    /// Build a frame, validating that the buffer matches the dimensions.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, seq: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame buffer length mismatch: expected {} RGB bytes, got {}",
                expected,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            seq,
        })
    }

    /// RGB triple at `(x, y)`. Callers must stay in bounds.
    #[inline]
    pub fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let idx = ((y * self.width + x) * 3) as usize;
        (self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2])
    }
}
