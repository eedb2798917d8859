use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Scripted backend for tests and dry runs.
///
/// Replays a queued list of per-frame outcomes regardless of pixel content.
/// Once the script runs out, every subsequent frame yields no detections.
pub struct ScriptedBackend {
    script: VecDeque<ScriptedFrame>,
}

enum ScriptedFrame {
    Detections(Vec<Detection>),
    Fail(String),
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
        }
    }

    /// Queue a frame's worth of detections.
    pub fn push_detections(&mut self, detections: Vec<Detection>) -> &mut Self {
        self.script.push_back(ScriptedFrame::Detections(detections));
        self
    }

    /// Queue a frame on which the backend reports a failure.
    pub fn push_failure(&mut self, message: &str) -> &mut Self {
        self.script.push_back(ScriptedFrame::Fail(message.to_string()));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        match self.script.pop_front() {
            Some(ScriptedFrame::Detections(detections)) => Ok(detections),
            Some(ScriptedFrame::Fail(message)) => Err(anyhow!("scripted failure: {}", message)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;
    use crate::ClassId;

    #[test]
    fn scripted_backend_replays_in_order() {
        let mut backend = ScriptedBackend::new();
        backend
            .push_detections(vec![Detection {
                class: ClassId::Skunk,
                confidence: 0.9,
                bbox: BoundingBox::new(0, 0, 10, 10),
            }])
            .push_failure("camera unplugged")
            .push_detections(vec![]);

        let frame = Frame::new(vec![0u8; 12], 2, 2, 1).unwrap();
        assert_eq!(backend.detect(&frame).unwrap().len(), 1);
        assert!(backend.detect(&frame).is_err());
        assert!(backend.detect(&frame).unwrap().is_empty());
        // Past the script's end: silence, not errors.
        assert!(backend.detect(&frame).unwrap().is_empty());
    }
}
