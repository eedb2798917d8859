use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::ClassId;

const DEFAULT_SOURCE_URL: &str = "stub://yard";
const DEFAULT_BACKEND: &str = "color";
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_CENTER_FRACTION: f32 = 0.3;
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;

const DEFAULT_SQUIRREL_PIN: u8 = 18;
const DEFAULT_SKUNK_PIN: u8 = 19;
const DEFAULT_RACCOON_PIN: u8 = 20;

#[derive(Debug, Deserialize, Default)]
struct TriggerConfigFile {
    source: Option<SourceConfigFile>,
    backend: Option<String>,
    model_path: Option<PathBuf>,
    confidence_threshold: Option<f32>,
    center_fraction: Option<f32>,
    pins: Option<BTreeMap<ClassId, u8>>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Frame source settings.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// Source URL: `stub://<name>`, `frames://<dir>` or `v4l2://<device>`.
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

/// Immutable run configuration.
///
/// Loaded from an optional JSON file (env `WILDLIFE_CONFIG`), then env-var
/// overrides, then validated. Invalid values fail at startup.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub source: SourceSettings,
    /// Detection backend name (`color` or `tract`).
    pub backend: String,
    /// ONNX model path for the `tract` backend.
    pub model_path: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub center_fraction: f32,
    /// Class to output-channel mapping. Non-empty; classes absent from the
    /// map are treated as always-rejected by the engine.
    pub pins: BTreeMap<ClassId, u8>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        let mut pins = BTreeMap::new();
        pins.insert(ClassId::Squirrel, DEFAULT_SQUIRREL_PIN);
        pins.insert(ClassId::Skunk, DEFAULT_SKUNK_PIN);
        pins.insert(ClassId::Raccoon, DEFAULT_RACCOON_PIN);
        Self {
            source: SourceSettings {
                url: DEFAULT_SOURCE_URL.to_string(),
                target_fps: DEFAULT_TARGET_FPS,
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
            },
            backend: DEFAULT_BACKEND.to_string(),
            model_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            center_fraction: DEFAULT_CENTER_FRACTION,
            pins,
        }
    }
}

impl TriggerConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("WILDLIFE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TriggerConfigFile) -> Self {
        let defaults = Self::default();
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|s| s.url.clone())
                .unwrap_or(defaults.source.url),
            target_fps: file
                .source
                .as_ref()
                .and_then(|s| s.target_fps)
                .unwrap_or(defaults.source.target_fps),
            width: file
                .source
                .as_ref()
                .and_then(|s| s.width)
                .unwrap_or(defaults.source.width),
            height: file
                .source
                .and_then(|s| s.height)
                .unwrap_or(defaults.source.height),
        };
        Self {
            source,
            backend: file.backend.unwrap_or(defaults.backend),
            model_path: file.model_path,
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            center_fraction: file.center_fraction.unwrap_or(defaults.center_fraction),
            pins: file.pins.unwrap_or(defaults.pins),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("WILDLIFE_SOURCE") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(backend) = std::env::var("WILDLIFE_BACKEND") {
            if !backend.trim().is_empty() {
                self.backend = backend;
            }
        }
        if let Ok(threshold) = std::env::var("WILDLIFE_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("WILDLIFE_CONFIDENCE_THRESHOLD must be a number"))?;
        }
        if let Ok(fraction) = std::env::var("WILDLIFE_CENTER_FRACTION") {
            self.center_fraction = fraction
                .parse()
                .map_err(|_| anyhow!("WILDLIFE_CENTER_FRACTION must be a number"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_threshold)
        {
            return Err(anyhow!(
                "confidence threshold must be in [0.0, 1.0], got {}",
                self.confidence_threshold
            ));
        }
        if !self.center_fraction.is_finite()
            || !(self.center_fraction > 0.0 && self.center_fraction <= 1.0)
        {
            return Err(anyhow!(
                "center fraction must be in (0.0, 1.0], got {}",
                self.center_fraction
            ));
        }
        if self.pins.is_empty() {
            return Err(anyhow!("at least one class must be mapped to an output channel"));
        }
        let mut seen = std::collections::BTreeSet::new();
        for (class, pin) in &self.pins {
            if !seen.insert(pin) {
                return Err(anyhow!(
                    "output channel {} is mapped to more than one class (including {})",
                    pin,
                    class
                ));
            }
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be >= 1"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<TriggerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TriggerConfig::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut cfg = TriggerConfig::default();
        cfg.confidence_threshold = 1.5;
        assert!(cfg.validate().is_err());
        cfg.confidence_threshold = -0.1;
        assert!(cfg.validate().is_err());
        cfg.confidence_threshold = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_center_fraction_is_rejected() {
        let mut cfg = TriggerConfig::default();
        cfg.center_fraction = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn duplicate_channels_are_rejected() {
        let mut cfg = TriggerConfig::default();
        cfg.pins.insert(ClassId::Skunk, DEFAULT_SQUIRREL_PIN);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_pin_map_is_rejected() {
        let mut cfg = TriggerConfig::default();
        cfg.pins.clear();
        assert!(cfg.validate().is_err());
    }
}
