//! Frame decision engine.
//!
//! Sits between "what the detector saw this frame" and "what should
//! physically happen": applies the acceptance policy, then advances one
//! IDLE/FIRING state machine per configured class, invoking the output
//! driver only on state transitions.

mod accept;
mod geometry;

use std::collections::{BTreeMap, BTreeSet};

use crate::actuate::OutputDriver;
use crate::config::TriggerConfig;
use crate::detect::result::Detection;
use crate::ClassId;

pub use accept::{assess_frame, Assessment};
pub use geometry::CenterRegion;

/// Whether a class's output is currently asserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TriggerState {
    Idle,
    Firing,
}

/// A failed activate/deactivate call, surfaced as a non-fatal diagnostic.
#[derive(Debug)]
pub struct ActuationFault {
    pub class: ClassId,
    /// True for a failed activate, false for a failed deactivate.
    pub activating: bool,
    pub error: anyhow::Error,
}

/// Everything that happened while evaluating one frame.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    /// Per-class winners that survived the acceptance policy.
    pub assessments: BTreeMap<ClassId, Assessment>,
    /// Classes whose output was switched on this frame.
    pub activated: Vec<ClassId>,
    /// Classes whose output was switched off this frame.
    pub deactivated: Vec<ClassId>,
    /// Failed output calls; the affected state machines held their state.
    pub faults: Vec<ActuationFault>,
}

impl FrameOutcome {
    pub fn quiet(&self) -> bool {
        self.activated.is_empty() && self.deactivated.is_empty() && self.faults.is_empty()
    }
}

struct CachedRegion {
    width: u32,
    height: u32,
    region: CenterRegion,
}

/// Stateful per-run decision engine.
///
/// Owns one trigger state per *mapped* class, created eagerly at
/// construction so startup behavior is deterministic. The state map is an
/// explicit owned structure: multiple engines never interfere.
pub struct FrameDecisionEngine {
    confidence_threshold: f32,
    center_fraction: f32,
    states: BTreeMap<ClassId, TriggerState>,
    cached: Option<CachedRegion>,
    unmapped_warned: BTreeSet<ClassId>,
}

impl FrameDecisionEngine {
    pub fn new(config: &TriggerConfig) -> Self {
        let states = config
            .pins
            .keys()
            .map(|class| (*class, TriggerState::Idle))
            .collect();
        Self {
            confidence_threshold: config.confidence_threshold,
            center_fraction: config.center_fraction,
            states,
            cached: None,
            unmapped_warned: BTreeSet::new(),
        }
    }

    /// True when the class's output is currently asserted.
    pub fn is_firing(&self, class: ClassId) -> bool {
        self.states.get(&class) == Some(&TriggerState::Firing)
    }

    /// Evaluate one frame's raw detections and drive the outputs.
    ///
    /// State only advances after the corresponding output call succeeds, so
    /// engine state and hardware never diverge. Failed calls are retried
    /// implicitly on the next frame that still wants the transition.
    pub fn process_frame(
        &mut self,
        frame_width: u32,
        frame_height: u32,
        detections: &[Detection],
        driver: &mut dyn OutputDriver,
    ) -> FrameOutcome {
        let mut assessments = match self.region_for(frame_width, frame_height) {
            Some(region) => assess_frame(detections, self.confidence_threshold, &region),
            None => {
                log::warn!(
                    "degenerate {}x{} frame, treating as empty",
                    frame_width,
                    frame_height
                );
                BTreeMap::new()
            }
        };
        self.reject_unmapped(&mut assessments);

        let mut outcome = FrameOutcome {
            assessments,
            ..FrameOutcome::default()
        };

        let classes: Vec<ClassId> = self.states.keys().copied().collect();
        for class in classes {
            let wanted = outcome
                .assessments
                .get(&class)
                .map(|a| a.in_center)
                .unwrap_or(false);
            let state = self.states[&class];

            match (state, wanted) {
                (TriggerState::Idle, true) => match driver.activate(class) {
                    Ok(()) => {
                        self.states.insert(class, TriggerState::Firing);
                        outcome.activated.push(class);
                    }
                    Err(error) => {
                        log::warn!("activate({}) failed, staying idle: {:#}", class, error);
                        outcome.faults.push(ActuationFault {
                            class,
                            activating: true,
                            error,
                        });
                    }
                },
                (TriggerState::Firing, false) => match driver.deactivate(class) {
                    Ok(()) => {
                        self.states.insert(class, TriggerState::Idle);
                        outcome.deactivated.push(class);
                    }
                    Err(error) => {
                        log::warn!("deactivate({}) failed, staying firing: {:#}", class, error);
                        outcome.faults.push(ActuationFault {
                            class,
                            activating: false,
                            error,
                        });
                    }
                },
                // Held or idle: no externally observable action.
                (TriggerState::Firing, true) | (TriggerState::Idle, false) => {}
            }
        }

        outcome
    }

    /// Release every FIRING class once. Called on shutdown and end-of-stream
    /// so no output is left asserted after the run ends.
    pub fn release_all(&mut self, driver: &mut dyn OutputDriver) -> Vec<ActuationFault> {
        let mut faults = Vec::new();
        let classes: Vec<ClassId> = self.states.keys().copied().collect();
        for class in classes {
            if self.states[&class] != TriggerState::Firing {
                continue;
            }
            match driver.deactivate(class) {
                Ok(()) => {
                    self.states.insert(class, TriggerState::Idle);
                    log::info!("released {} on shutdown", class);
                }
                Err(error) => {
                    log::error!("failed to release {} on shutdown: {:#}", class, error);
                    faults.push(ActuationFault {
                        class,
                        activating: false,
                        error,
                    });
                }
            }
        }
        faults
    }

    /// Cached center region, recomputed when the source resolution changes.
    /// `None` for zero-area frames, which carry nothing worth assessing.
    fn region_for(&mut self, width: u32, height: u32) -> Option<CenterRegion> {
        if width == 0 || height == 0 {
            return None;
        }
        match &self.cached {
            Some(cached) if cached.width == width && cached.height == height => {
                Some(cached.region)
            }
            _ => {
                if let Some(previous) = &self.cached {
                    log::info!(
                        "frame resolution changed {}x{} -> {}x{}, recomputing center region",
                        previous.width,
                        previous.height,
                        width,
                        height
                    );
                }
                // The fraction was validated at config load and the
                // dimensions are non-zero, so construction cannot fail.
                let region = CenterRegion::new(width, height, self.center_fraction).ok()?;
                self.cached = Some(CachedRegion {
                    width,
                    height,
                    region,
                });
                Some(region)
            }
        }
    }

    /// Detections of classes without a configured output channel are always
    /// rejected; warn once per class per run, not per frame.
    fn reject_unmapped(&mut self, assessments: &mut BTreeMap<ClassId, Assessment>) {
        let unmapped: Vec<ClassId> = assessments
            .keys()
            .filter(|class| !self.states.contains_key(class))
            .copied()
            .collect();
        for class in unmapped {
            if self.unmapped_warned.insert(class) {
                log::warn!(
                    "class {} has no configured output channel; its detections are ignored",
                    class
                );
            }
            assessments.remove(&class);
        }
    }
}
