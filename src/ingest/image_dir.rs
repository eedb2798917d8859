#![cfg(feature = "ingest-image")]

//! Image-sequence frame source.
//!
//! Plays back a directory of still images (JPEG/PNG) in lexicographic
//! order, standing in for recorded video during development. Decoding goes
//! through the `image` crate; end of the sequence is a normal end-of-stream.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;

use crate::frame::Frame;
use crate::ingest::FrameSource;

pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next_index: usize,
    /// Restart from the first file after the last one.
    pub looping: bool,
    frame_count: u64,
}

impl ImageDirSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            files: Vec::new(),
            next_index: 0,
            looping: false,
            frame_count: 0,
        })
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    fn decode(&self, path: &Path) -> Result<(Vec<u8>, u32, u32)> {
        let image = image::open(path)
            .with_context(|| format!("decode image {}", path.display()))?;
        let (width, height) = image.dimensions();
        let rgb = image.into_rgb8();
        Ok((rgb.into_raw(), width, height))
    }
}

impl FrameSource for ImageDirSource {
    fn connect(&mut self) -> Result<()> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .with_context(|| format!("read frame directory {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("jpg" | "jpeg" | "png")
                )
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(anyhow!(
                "no image frames found in {}",
                self.dir.display()
            ));
        }

        log::info!(
            "ImageDirSource: {} frames in {}",
            files.len(),
            self.dir.display()
        );
        self.files = files;
        self.next_index = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next_index >= self.files.len() {
            if !self.looping || self.files.is_empty() {
                return Ok(None);
            }
            self.next_index = 0;
        }

        let path = self.files[self.next_index].clone();
        self.next_index += 1;
        self.frame_count += 1;

        let (pixels, width, height) = self.decode(&path)?;
        Ok(Some(Frame::new(pixels, width, height, self.frame_count)?))
    }
}
