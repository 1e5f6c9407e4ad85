use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Environment variables the service and client read.
#[derive(Clone, Copy, Debug)]
pub enum EnvKey {
    ServerPort,
    UploadDir,
    ProcessedDir,
    TempDir,
    FfmpegPath,
    FfprobePath,
    MaxUploadBytes,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::UploadDir => "UPLOAD_DIR",
            EnvKey::ProcessedDir => "PROCESSED_DIR",
            EnvKey::TempDir => "TEMP_DIR",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::MaxUploadBytes => "MAX_UPLOAD_BYTES",
        }
    }
}

/// Set and non-blank, otherwise `None`.
pub fn get(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_path(key: EnvKey, default: impl Into<PathBuf>) -> PathBuf {
    get(key).map(PathBuf::from).unwrap_or_else(|| default.into())
}

/// Falls back to `default` when unset; an unparsable value is logged and
/// also falls back.
pub fn get_parsed<T: FromStr + std::fmt::Display>(key: EnvKey, default: T) -> T {
    let Some(raw) = get(key) else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(val) => val,
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using {}", key.as_str(), raw, default);
            default
        }
    }
}
