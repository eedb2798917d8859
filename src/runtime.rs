//! Run loop.
//!
//! Single-threaded and synchronous: one frame is fully processed
//! (acquisition -> detection -> decision -> actuation) before the next is
//! pulled. The shutdown flag is observed between frames, and every FIRING
//! class is released before the loop returns, on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::actuate::OutputDriver;
use crate::detect::DetectorBackend;
use crate::engine::FrameDecisionEngine;
use crate::ingest::FrameSource;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Counters for one run of the loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    pub frames: u64,
    pub detections: u64,
    pub activations: u64,
    pub deactivations: u64,
    /// Frames on which the detection backend failed (treated as empty).
    pub detector_faults: u64,
    /// Failed activate/deactivate calls (state held, retried next frame).
    pub actuation_faults: u64,
}

/// Pull frames until end-of-stream, a fatal source error, or shutdown.
///
/// End-of-stream terminates gracefully; source errors propagate after
/// cleanup; a failed detection call only costs that one frame.
pub fn run(
    source: &mut dyn FrameSource,
    backend: &mut dyn DetectorBackend,
    engine: &mut FrameDecisionEngine,
    driver: &mut dyn OutputDriver,
    shutdown: &AtomicBool,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let mut last_health_log = Instant::now();

    while !shutdown.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("source signaled end of stream after {} frames", stats.frames);
                break;
            }
            Err(err) => {
                log::error!("frame source failed: {:#}", err);
                engine.release_all(driver);
                return Err(err);
            }
        };
        stats.frames += 1;

        let detections = match backend.detect(&frame) {
            Ok(detections) => detections,
            Err(err) => {
                // A single bad frame must never abort the run.
                log::warn!(
                    "detection failed on frame {} (continuing with none): {:#}",
                    frame.seq,
                    err
                );
                stats.detector_faults += 1;
                Vec::new()
            }
        };
        stats.detections += detections.len() as u64;

        let outcome = engine.process_frame(frame.width, frame.height, &detections, driver);
        for class in &outcome.activated {
            let assessment = &outcome.assessments[class];
            log::info!(
                "{} entered center (confidence {:.2}, bbox {:?})",
                class,
                assessment.detection.confidence,
                assessment.detection.bbox
            );
        }
        for class in &outcome.deactivated {
            log::info!("{} left center", class);
        }
        stats.activations += outcome.activated.len() as u64;
        stats.deactivations += outcome.deactivated.len() as u64;
        stats.actuation_faults += outcome.faults.len() as u64;

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            log::info!(
                "source health={} frames={} activations={}",
                source.is_healthy(),
                stats.frames,
                stats.activations
            );
            last_health_log = Instant::now();
        }
    }

    // Cleanup guarantee: no output left asserted after the loop ends.
    let faults = engine.release_all(driver);
    stats.actuation_faults += faults.len() as u64;

    Ok(stats)
}
