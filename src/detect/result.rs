use crate::ClassId;

/// One candidate object instance reported by a backend for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class: ClassId,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Pixel-space bounding box, clipped to the frame.
    pub bbox: BoundingBox,
}

/// Axis-aligned bounding box in pixel coordinates.
///
/// `width` and `height` are always positive for boxes emitted by backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centroid of the box, used for center-region containment.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_midpoint() {
        let bbox = BoundingBox::new(300, 220, 40, 40);
        assert_eq!(bbox.center(), (320.0, 240.0));
        assert_eq!(bbox.area(), 1600);
    }

    #[test]
    fn center_handles_odd_sizes() {
        let bbox = BoundingBox::new(0, 0, 3, 5);
        assert_eq!(bbox.center(), (1.5, 2.5));
    }
}
