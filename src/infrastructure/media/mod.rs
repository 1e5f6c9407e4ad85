//! Decode/resize/encode capability the transcoder drives.
//!
//! Handles returned by [`MediaBackend::open`] and [`MediaSource::resized`]
//! own their underlying resources and release them when dropped, so callers
//! get release on every exit path by scoping them.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod ffmpeg;
pub mod probe;

pub use ffmpeg::FfmpegBackend;

/// Properties of the decoded source as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Seconds.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

/// Output policy for a single encode.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub video_codec: String,
    pub audio_codec: String,
    /// Side file for the re-encoded audio track. Must be unique per job.
    pub temp_audio: PathBuf,
}

impl EncodeSettings {
    pub fn h264_aac(temp_audio: PathBuf) -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            temp_audio,
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Input file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub trait MediaBackend: Send + Sync {
    /// Opens `path` as a decodable video source.
    fn open(&self, path: &Path) -> Result<Box<dyn MediaSource>, MediaError>;
}

pub trait MediaSource: Send {
    fn info(&self) -> &VideoInfo;

    /// Frame size this handle produces when written.
    fn dimensions(&self) -> (u32, u32);

    /// A new handle producing frames scaled to `width`x`height`. The receiver
    /// stays open and must still be released by its owner.
    fn resized(&self, width: u32, height: u32) -> Result<Box<dyn MediaSource>, MediaError>;

    /// Encodes to `target`, overwriting it. On error `target` may hold a
    /// partial file; removing it is the caller's job.
    fn write(&self, target: &Path, settings: &EncodeSettings) -> Result<(), MediaError>;
}
