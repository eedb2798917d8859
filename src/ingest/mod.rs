//! Frame ingestion sources.
//!
//! This module provides different sources for frames:
//! - Synthetic scenes (`stub://`, testing and demos)
//! - Image-sequence directories (feature: ingest-image)
//! - USB/V4L2 devices (feature: ingest-v4l2)
//!
//! All sources produce `Frame` instances and signal end-of-stream by
//! returning `Ok(None)` from `next_frame`; errors are reserved for sources
//! that cannot produce frames at all.

#[cfg(feature = "ingest-image")]
pub mod image_dir;
#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

#[cfg(feature = "ingest-image")]
pub use image_dir::ImageDirSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

use anyhow::{anyhow, Result};

use crate::config::SourceSettings;
use crate::frame::Frame;

/// Blocking frame source.
pub trait FrameSource: Send {
    /// Open the underlying device/file. Must be called before `next_frame`.
    fn connect(&mut self) -> Result<()>;

    /// Pull the next frame. `Ok(None)` signals normal end-of-stream;
    /// `Err` signals a source that cannot produce frames.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Liveness indication for periodic health logging.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Open a frame source from its URL.
///
/// Supported schemes: `stub://` (synthetic), `frames://` (image sequence
/// directory, feature `ingest-image`), `v4l2://` (capture device, feature
/// `ingest-v4l2`).
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(SyntheticConfig {
            width: settings.width,
            height: settings.height,
            frame_limit: None,
        })));
    }

    if let Some(dir) = settings.url.strip_prefix("frames://") {
        #[cfg(feature = "ingest-image")]
        {
            return Ok(Box::new(ImageDirSource::new(dir)?));
        }
        #[cfg(not(feature = "ingest-image"))]
        {
            let _ = dir;
            return Err(anyhow!(
                "frames:// sources require the ingest-image feature"
            ));
        }
    }

    if let Some(device) = settings.url.strip_prefix("v4l2://") {
        #[cfg(feature = "ingest-v4l2")]
        {
            return Ok(Box::new(V4l2Source::new(v4l2::V4l2Config {
                device: device.to_string(),
                target_fps: settings.target_fps,
                width: settings.width,
                height: settings.height,
            })?));
        }
        #[cfg(not(feature = "ingest-v4l2"))]
        {
            let _ = device;
            return Err(anyhow!("v4l2:// sources require the ingest-v4l2 feature"));
        }
    }

    Err(anyhow!(
        "unsupported source url '{}' (expected stub://, frames:// or v4l2://)",
        settings.url
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> SourceSettings {
        SourceSettings {
            url: url.to_string(),
            target_fps: 10,
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn stub_urls_open_a_synthetic_source() {
        let mut source = open_source(&settings("stub://yard")).unwrap();
        source.connect().unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
    }

    #[test]
    fn unknown_schemes_are_rejected() {
        assert!(open_source(&settings("rtsp://camera")).is_err());
        assert!(open_source(&settings("/dev/video0")).is_err());
    }
}
