//! FFprobe JSON parsing.

use super::{MediaError, VideoInfo};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    tags: StreamTags,
    #[serde(default)]
    side_data_list: Vec<SideData>,
}

impl ProbeStream {
    /// Display rotation in degrees, normalised to `0..360`. The displaymatrix
    /// side data wins over the legacy `rotate` tag.
    fn rotation(&self) -> i64 {
        let degrees = self
            .side_data_list
            .iter()
            .find_map(|d| d.rotation)
            .or_else(|| self.tags.rotate.as_deref().and_then(|r| r.trim().parse::<f64>().ok()))
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);

        (degrees.round() as i64).rem_euclid(360)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

fn parse_seconds(s: Option<&String>) -> Option<f64> {
    s.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Parses `ffprobe -print_format json -show_format -show_streams` output.
/// A container without a sized video stream is not a decodable video.
pub fn parse_probe_json(json: &str) -> Result<VideoInfo, MediaError> {
    let output: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| MediaError::Decode(format!("Failed to parse ffprobe output: {}", e)))?;

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaError::Decode("No video stream found".to_string()))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(MediaError::Decode("Video stream has no frame size".to_string())),
    };

    // ffmpeg autorotates before filtering, so sizes are reported as displayed.
    let (width, height) = match video.rotation() {
        90 | 270 => (height, width),
        _ => (width, height),
    };

    let duration = parse_seconds(output.format.as_ref().and_then(|f| f.duration.as_ref()))
        .or_else(|| parse_seconds(video.duration.as_ref()))
        .unwrap_or(0.0);

    let has_audio = output
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoInfo {
        duration,
        width,
        height,
        has_audio,
    })
}
