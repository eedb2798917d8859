use anyhow::{anyhow, Result};

/// The central rectangle of the frame used to gate triggering.
///
/// Sized as `frame_width * fraction` by `frame_height * fraction`, centered
/// on the frame midpoint. Containment is inclusive on all four sides, so a
/// centroid landing exactly on the boundary counts as inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterRegion {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl CenterRegion {
    pub fn new(frame_width: u32, frame_height: u32, fraction: f32) -> Result<Self> {
        if frame_width == 0 || frame_height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(anyhow!(
                "center fraction must be in (0.0, 1.0], got {}",
                fraction
            ));
        }

        let mid_x = frame_width as f64 / 2.0;
        let mid_y = frame_height as f64 / 2.0;
        let half_w = frame_width as f64 * fraction as f64 / 2.0;
        let half_h = frame_height as f64 * fraction as f64 / 2.0;

        Ok(Self {
            min_x: mid_x - half_w,
            min_y: mid_y - half_h,
            max_x: mid_x + half_w,
            max_y: mid_y + half_h,
        })
    }

    /// Closed-interval containment test for a point.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
