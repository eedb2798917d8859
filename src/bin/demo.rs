//! demo - end-to-end synthetic run for the wildlife trigger
//!
//! Sweeps a synthetic brown blob through the frame center, runs the
//! heuristic color backend, and reports the trigger episodes observed on
//! simulated pins.

use std::sync::atomic::AtomicBool;

use anyhow::{anyhow, Result};
use clap::Parser;

use wildlife_trigger::ingest::{SyntheticConfig, SyntheticSource};
use wildlife_trigger::{
    ClassId, ColorBackend, FrameDecisionEngine, FrameSource, MemoryPins, TriggerConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds of synthetic footage.
    #[arg(long, default_value_t = 12)]
    seconds: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 10)]
    fps: u32,
    /// Frame width.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Frame height.
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Minimum confidence for detection.
    #[arg(long, default_value_t = 0.25)]
    confidence_threshold: f32,
    /// Fraction of the frame considered "center".
    #[arg(long, default_value_t = 0.3)]
    center_fraction: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }

    let mut cfg = TriggerConfig::default();
    cfg.confidence_threshold = args.confidence_threshold;
    cfg.center_fraction = args.center_fraction;
    cfg.validate()?;

    stage("render synthetic frames");
    let total_frames = args.seconds.saturating_mul(args.fps as u64);
    let mut source = SyntheticSource::new(SyntheticConfig {
        width: args.width,
        height: args.height,
        frame_limit: Some(total_frames),
    });
    source.connect()?;

    stage("run detection + trigger loop");
    let mut backend = ColorBackend::new();
    let mut pins = MemoryPins::new(&cfg.pins);
    let mut engine = FrameDecisionEngine::new(&cfg);
    let shutdown = AtomicBool::new(false);

    let stats = wildlife_trigger::run(
        &mut source,
        &mut backend,
        &mut engine,
        &mut pins,
        &shutdown,
    )?;

    println!("demo summary:");
    println!("  frames processed: {}", stats.frames);
    println!("  raw detections: {}", stats.detections);
    println!("  trigger episodes: {}", stats.activations);
    println!(
        "  squirrel pin activations/deactivations: {}/{}",
        pins.activation_count(ClassId::Squirrel),
        pins.deactivation_count(ClassId::Squirrel)
    );
    println!(
        "  pin left asserted after shutdown: {}",
        pins.pin_state(ClassId::Squirrel)
    );
    println!("next steps:");
    println!("  cargo run --bin wildlifed -- --source stub://yard");
    println!("  RUST_LOG=debug cargo run --bin demo -- --seconds 30");

    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
