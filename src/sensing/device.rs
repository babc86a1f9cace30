use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use log::{info, warn};

/// A capture device the sampler can open, read the current frame from, and close.
///
/// `open` may block (permission prompts, device enumeration); the sampler runs it
/// off the async runtime.
pub trait CameraDevice: Send + 'static {
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    /// The frame currently on screen, or `None` while the stream is warming up.
    fn current_frame(&mut self) -> Option<DynamicImage>;

    fn close(&mut self);
}

const REPLAY_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Plays back the still images of a directory in name order, looping forever.
pub struct ReplayCamera {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    cursor: usize,
    open: bool,
}

impl ReplayCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            frames: Vec::new(),
            cursor: 0,
            open: false,
        }
    }

    fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("cannot read camera directory {}", dir.display()))?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| REPLAY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();
        Ok(frames)
    }
}

impl CameraDevice for ReplayCamera {
    fn name(&self) -> &str {
        "replay"
    }

    fn open(&mut self) -> Result<()> {
        let frames = Self::scan(&self.dir)?;
        if frames.is_empty() {
            bail!("no still images found in {}", self.dir.display());
        }
        info!(
            "Replay camera opened with {} frames from {}",
            frames.len(),
            self.dir.display()
        );
        self.frames = frames;
        self.cursor = 0;
        self.open = true;
        Ok(())
    }

    fn current_frame(&mut self) -> Option<DynamicImage> {
        if !self.open || self.frames.is_empty() {
            return None;
        }

        let path = &self.frames[self.cursor % self.frames.len()];
        self.cursor = (self.cursor + 1) % self.frames.len();

        match image::open(path) {
            Ok(img) => Some(img),
            Err(err) => {
                warn!("skipping unreadable replay frame {}: {err}", path.display());
                None
            }
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.frames.clear();
        self.cursor = 0;
    }
}
