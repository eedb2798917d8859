use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Detector backend trait.
///
/// Backends look at one frame and report zero or more candidate detections.
/// They must treat the frame as read-only; all filtering, winner selection,
/// and center-region gating happens downstream in the decision engine.
///
/// A failed `detect` call is non-fatal to the run loop: the frame is treated
/// as if it yielded no detections.
pub trait DetectorBackend: Send {
    /// Backend identifier used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Optional warm-up hook (model load checks, first-inference priming).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
