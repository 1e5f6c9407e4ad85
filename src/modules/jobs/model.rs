use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];
pub const DEFAULT_RESOLUTION: &str = "480p";

/// Named output presets. Anything unrecognised keeps the source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    P720,
    P480,
    P360,
    Native,
}

impl Resolution {
    pub fn parse(value: &str) -> Self {
        match value {
            "720p" => Resolution::P720,
            "480p" => Resolution::P480,
            "360p" => Resolution::P360,
            _ => Resolution::Native,
        }
    }

    pub fn target_height(self) -> Option<u32> {
        match self {
            Resolution::P720 => Some(720),
            Resolution::P480 => Some(480),
            Resolution::P360 => Some(360),
            Resolution::Native => None,
        }
    }

    /// Output frame size for a source of `width`x`height`, keeping the aspect
    /// ratio. Never stretches or crops.
    pub fn target_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        match self.target_height() {
            Some(target) if height > 0 => {
                let scaled = (target as f64 * width as f64 / height as f64).round() as u32;
                (scaled.max(1), target)
            }
            _ => (width, height),
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::parse(DEFAULT_RESOLUTION)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::P720 => "720p",
            Resolution::P480 => "480p",
            Resolution::P360 => "360p",
            Resolution::Native => "native",
        };
        f.write_str(name)
    }
}

/// Lowercased extension of `filename` if it is one the service accepts.
/// Whatever follows the last dot counts, so a bare `.mp4` is accepted.
pub fn accepted_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Uploaded,
    Processing,
    Processed,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub state: JobState,
    pub error: Option<String>,
}
