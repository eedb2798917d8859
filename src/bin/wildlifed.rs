//! wildlifed - wildlife trigger daemon
//!
//! This daemon:
//! 1. Ingests frames from the configured source (synthetic, image sequence, V4L2)
//! 2. Runs the configured detection backend on each frame
//! 3. Evaluates center-region acceptance and per-class trigger state
//! 4. Drives one output channel per class, edge-triggered
//! 5. Releases every asserted channel on shutdown

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;

use wildlife_trigger::{
    open_source, BackendRegistry, ColorBackend, FrameDecisionEngine, OutputDriver, TriggerConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file path (JSON). Also honored via WILDLIFE_CONFIG.
    #[arg(long, env = "WILDLIFE_CONFIG")]
    config: Option<PathBuf>,
    /// Frame source url (stub://, frames://, v4l2://), overrides the config file.
    #[arg(long)]
    source: Option<String>,
    /// Detection backend name, overrides the config file.
    #[arg(long)]
    backend: Option<String>,
    /// Minimum confidence for detection (0.0-1.0), overrides the config file.
    #[arg(long)]
    confidence_threshold: Option<f32>,
    /// Fraction of the frame considered "center" (0.0-1.0), overrides the config file.
    #[arg(long)]
    center_fraction: Option<f32>,
    /// ONNX model path for the tract backend, overrides the config file.
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Some(path) = &args.config {
        // TriggerConfig::load reads WILDLIFE_CONFIG; let --config win.
        std::env::set_var("WILDLIFE_CONFIG", path);
    }

    let mut cfg = TriggerConfig::load()?;
    if let Some(source) = args.source {
        cfg.source.url = source;
    }
    if let Some(backend) = args.backend {
        cfg.backend = backend;
    }
    if let Some(threshold) = args.confidence_threshold {
        cfg.confidence_threshold = threshold;
    }
    if let Some(fraction) = args.center_fraction {
        cfg.center_fraction = fraction;
    }
    if let Some(model) = args.model {
        cfg.model_path = Some(model);
    }
    cfg.validate()?;

    log::info!(
        "wildlifed starting: source={} backend={} threshold={} center_fraction={}",
        cfg.source.url,
        cfg.backend,
        cfg.confidence_threshold,
        cfg.center_fraction
    );
    for (class, pin) in &cfg.pins {
        log::info!("output channel {} mapped to {}", pin, class);
    }

    let mut source = open_source(&cfg.source)?;
    source.connect()?;

    let mut registry = BackendRegistry::new();
    registry.register(ColorBackend::new());
    #[cfg(feature = "backend-tract")]
    {
        if let Some(model_path) = &cfg.model_path {
            registry.register(wildlife_trigger::TractBackend::new(model_path, 640)?);
        } else if cfg.backend == "tract" {
            return Err(anyhow!("the tract backend requires --model or model_path"));
        }
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        if cfg.backend == "tract" {
            return Err(anyhow!(
                "this build does not include the tract backend (feature backend-tract)"
            ));
        }
    }
    let mut backend = registry.take(&cfg.backend)?;
    backend.warm_up()?;

    let mut driver = build_driver(&cfg)?;
    let mut engine = FrameDecisionEngine::new(&cfg);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            log::info!("shutdown signal received, finishing current frame...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .expect("error setting Ctrl-C handler");
    }

    let stats = wildlife_trigger::run(
        source.as_mut(),
        backend.as_mut(),
        &mut engine,
        driver.as_mut(),
        &shutdown,
    )?;

    log::info!(
        "wildlifed done: frames={} detections={} activations={} deactivations={} detector_faults={} actuation_faults={}",
        stats.frames,
        stats.detections,
        stats.activations,
        stats.deactivations,
        stats.detector_faults,
        stats.actuation_faults
    );
    Ok(())
}

#[cfg(feature = "gpio-rppal")]
fn build_driver(cfg: &TriggerConfig) -> Result<Box<dyn OutputDriver>> {
    Ok(Box::new(wildlife_trigger::GpioPins::new(&cfg.pins)?))
}

#[cfg(not(feature = "gpio-rppal"))]
fn build_driver(cfg: &TriggerConfig) -> Result<Box<dyn OutputDriver>> {
    log::info!("no GPIO support in this build, using simulated output pins");
    Ok(Box::new(wildlife_trigger::MemoryPins::new(&cfg.pins)))
}
