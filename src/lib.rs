//! Wildlife trigger core.
//!
//! This crate watches a video source, classifies whether a target animal is
//! inside a configurable center region of the frame, and drives one digital
//! output channel per class with edge-triggered activations.
//!
//! # Architecture
//!
//! - `ingest`: frame sources (synthetic, image sequences, V4L2 devices)
//! - `detect`: detection backends behind one trait (heuristic color blob,
//!   ONNX object detector)
//! - `engine`: the decision core - center-region geometry, per-frame
//!   acceptance policy, per-class IDLE/FIRING state machine
//! - `actuate`: output channel drivers (simulated pins, Raspberry Pi GPIO)
//! - `runtime`: the sequencing loop tying the above together
//!
//! The engine is a pure, synchronous, stateful filter: one frame is fully
//! processed before the next is pulled, and trigger state only advances after
//! the corresponding output call succeeds.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

pub mod actuate;
pub mod config;
pub mod detect;
pub mod engine;
pub mod frame;
pub mod ingest;
pub mod runtime;

pub use actuate::{MemoryPins, OutputDriver};
pub use config::{SourceSettings, TriggerConfig};
pub use detect::{BackendRegistry, BoundingBox, ColorBackend, Detection, DetectorBackend, ScriptedBackend};
pub use engine::{Assessment, FrameDecisionEngine, FrameOutcome};
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, SyntheticSource};
pub use runtime::{run, RunStats};

#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
#[cfg(feature = "gpio-rppal")]
pub use actuate::GpioPins;

/// Target animal classes the detection backends can emit.
///
/// The set is fixed at compile time; the heuristic color backend only ever
/// reports `Squirrel`. Ordering is derived so per-class iteration and log
/// output are deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassId {
    Squirrel,
    Skunk,
    Raccoon,
}

impl ClassId {
    /// Every class a backend can emit, in canonical order.
    pub const ALL: [ClassId; 3] = [ClassId::Squirrel, ClassId::Skunk, ClassId::Raccoon];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassId::Squirrel => "squirrel",
            ClassId::Skunk => "skunk",
            ClassId::Raccoon => "raccoon",
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squirrel" => Ok(ClassId::Squirrel),
            "skunk" => Ok(ClassId::Skunk),
            "raccoon" => Ok(ClassId::Raccoon),
            other => Err(anyhow!("unknown class '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_round_trip() {
        for class in ClassId::ALL {
            assert_eq!(class.as_str().parse::<ClassId>().unwrap(), class);
        }
        assert!("opossum".parse::<ClassId>().is_err());
    }
}
