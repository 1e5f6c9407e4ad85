use crate::config::env::{self, EnvKey};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
/// 100 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, DEFAULT_PORT),
            upload_dir: env::get_path(EnvKey::UploadDir, "uploads"),
            processed_dir: env::get_path(EnvKey::ProcessedDir, "processed"),
            temp_dir: env::get_path(EnvKey::TempDir, std::env::temp_dir()),
            ffmpeg_path: env::get_path(EnvKey::FfmpegPath, "ffmpeg"),
            ffprobe_path: env::get_path(EnvKey::FfprobePath, "ffprobe"),
            max_upload_bytes: env::get_parsed(EnvKey::MaxUploadBytes, DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    /// Config rooted in `base`, used by tests and local tooling.
    pub fn with_root(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            server_port: DEFAULT_PORT,
            upload_dir: base.join("uploads"),
            processed_dir: base.join("processed"),
            temp_dir: base.join("tmp"),
            ffmpeg_path: "ffmpeg".into(),
            ffprobe_path: "ffprobe".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_root_places_directories_under_base() {
        let config = AppConfig::with_root("/srv/video");
        assert_eq!(config.upload_dir, PathBuf::from("/srv/video/uploads"));
        assert_eq!(config.processed_dir, PathBuf::from("/srv/video/processed"));
        assert_eq!(config.temp_dir, PathBuf::from("/srv/video/tmp"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }
}
