use super::probe::parse_probe_json;
use super::{EncodeSettings, MediaBackend, MediaError, MediaSource, VideoInfo};
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

const SUMMARY_MAX_LEN: usize = 200;

/// Media backend that shells out to `ffprobe` for decoding metadata and
/// `ffmpeg` for the encode.
#[derive(Clone, Debug)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn probe(&self, path: &Path) -> Result<VideoInfo, MediaError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MediaError::Decode(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Decode(failure_summary("ffprobe", &stderr, output.status.code())));
        }

        let json = String::from_utf8(output.stdout)
            .map_err(|_| MediaError::Decode("ffprobe output was not valid UTF-8".to_string()))?;

        parse_probe_json(&json)
    }
}

impl MediaBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn MediaSource>, MediaError> {
        // Held for the lifetime of the source so the input stays pinned while
        // the encode runs.
        let handle = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaError::Missing(path.to_path_buf()),
            _ => MediaError::Io(e),
        })?;

        let info = self.probe(path)?;
        debug!(
            "Opened {} ({}x{}, {:.2}s, audio: {})",
            path.display(),
            info.width,
            info.height,
            info.duration,
            info.has_audio
        );

        Ok(Box::new(FfmpegSource {
            ffmpeg: self.ffmpeg.clone(),
            input: path.to_path_buf(),
            size: (info.width, info.height),
            info,
            _handle: handle,
        }))
    }
}

struct FfmpegSource {
    ffmpeg: PathBuf,
    input: PathBuf,
    info: VideoInfo,
    size: (u32, u32),
    _handle: File,
}

impl FfmpegSource {
    fn scale(&self) -> Option<(u32, u32)> {
        (self.size != (self.info.width, self.info.height)).then_some(self.size)
    }
}

impl MediaSource for FfmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    fn resized(&self, width: u32, height: u32) -> Result<Box<dyn MediaSource>, MediaError> {
        if width == 0 || height == 0 {
            return Err(MediaError::Encode(format!("Invalid target size {}x{}", width, height)));
        }

        Ok(Box::new(FfmpegSource {
            ffmpeg: self.ffmpeg.clone(),
            input: self.input.clone(),
            info: self.info.clone(),
            size: (width, height),
            _handle: self._handle.try_clone()?,
        }))
    }

    fn write(&self, target: &Path, settings: &EncodeSettings) -> Result<(), MediaError> {
        let audio = if self.info.has_audio {
            let temp = TempAudio(settings.temp_audio.clone());
            run_ffmpeg(&self.ffmpeg, &audio_args(&self.input, settings))?;
            Some(temp)
        } else {
            None
        };

        let args = encode_args(
            &self.input,
            audio.as_ref().map(|a| a.0.as_path()),
            self.scale(),
            self.size,
            settings,
            target,
        );
        run_ffmpeg(&self.ffmpeg, &args)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        debug!("Released source {} ({}x{})", self.input.display(), self.size.0, self.size.1);
    }
}

/// Removes the temporary audio track when the encode is done with it.
struct TempAudio(PathBuf);

impl Drop for TempAudio {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temp audio {}: {}", self.0.display(), e);
            }
        }
    }
}

fn audio_args(input: &Path, settings: &EncodeSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.into());
    for a in ["-vn", "-map", "0:a:0", "-c:a", settings.audio_codec.as_str()] {
        args.push(a.into());
    }
    args.push(settings.temp_audio.clone().into());
    args
}

/// Argument list for the final encode. 4:2:0 chroma needs even dimensions,
/// so odd output sizes fall back to 4:4:4.
fn encode_args(
    input: &Path,
    audio: Option<&Path>,
    scale: Option<(u32, u32)>,
    size: (u32, u32),
    settings: &EncodeSettings,
    target: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.into());

    if let Some(audio) = audio {
        args.push("-i".into());
        args.push(audio.into());
    }

    args.push("-map".into());
    args.push("0:v:0".into());
    if audio.is_some() {
        args.push("-map".into());
        args.push("1:a:0".into());
    }

    if let Some((w, h)) = scale {
        args.push("-vf".into());
        args.push(format!("scale={}:{}", w, h).into());
    }

    let pix_fmt = if size.0 % 2 == 0 && size.1 % 2 == 0 { "yuv420p" } else { "yuv444p" };
    for a in ["-c:v", settings.video_codec.as_str(), "-pix_fmt", pix_fmt] {
        args.push(a.into());
    }

    if audio.is_some() {
        args.push("-c:a".into());
        args.push("copy".into());
    } else {
        args.push("-an".into());
    }

    args.push("-movflags".into());
    args.push("+faststart".into());
    args.push(target.into());
    args
}

fn run_ffmpeg(ffmpeg: &Path, args: &[OsString]) -> Result<(), MediaError> {
    debug!("Running {} {:?}", ffmpeg.display(), args);

    let output = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| MediaError::Encode(format!("FFmpeg not found or failed to start: {}", e)))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(MediaError::Encode(failure_summary("FFmpeg", &stderr, output.status.code())))
}

/// Short human-readable cause: exit code plus the last non-empty stderr line,
/// which is where ffmpeg reports the fatal error.
fn failure_summary(tool: &str, stderr: &str, exit_code: Option<i32>) -> String {
    let head = match exit_code {
        Some(code) => format!("{} failed (exit code {})", tool, code),
        None => format!("{} was terminated", tool),
    };

    match stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => format!("{}: {}", head, truncate(line, SUMMARY_MAX_LEN)),
        None => head,
    }
}

fn truncate(line: &str, max_len: usize) -> String {
    if line.len() <= max_len {
        return line.to_string();
    }
    let mut end = max_len;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &line[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn settings() -> EncodeSettings {
        EncodeSettings::h264_aac(PathBuf::from("/tmp/job-temp-audio.m4a"))
    }

    #[test]
    fn encode_args_scale_and_mux_audio() {
        let args = strings(&encode_args(
            Path::new("in.mp4"),
            Some(Path::new("/tmp/job-temp-audio.m4a")),
            Some((854, 480)),
            (854, 480),
            &settings(),
            Path::new("out.mp4"),
        ));

        let joined = args.join(" ");
        assert!(joined.contains("-i in.mp4 -i /tmp/job-temp-audio.m4a"));
        assert!(joined.contains("-map 0:v:0 -map 1:a:0"));
        assert!(joined.contains("-vf scale=854:480"));
        assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p"));
        assert!(joined.contains("-c:a copy"));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn encode_args_passthrough_without_audio() {
        let args = strings(&encode_args(
            Path::new("in.mov"),
            None,
            None,
            (1920, 1080),
            &settings(),
            Path::new("out.mp4"),
        ));

        assert!(!args.iter().any(|a| a == "-vf"));
        assert!(args.iter().any(|a| a == "-an"));
        assert!(!args.iter().any(|a| a == "1:a:0"));
    }

    #[test]
    fn odd_width_uses_full_chroma() {
        let args = strings(&encode_args(
            Path::new("in.mp4"),
            None,
            Some((853, 480)),
            (853, 480),
            &settings(),
            Path::new("out.mp4"),
        ));
        assert!(args.join(" ").contains("-pix_fmt yuv444p"));
    }

    #[test]
    fn audio_args_write_to_temp_side_file() {
        let args = strings(&audio_args(Path::new("in.avi"), &settings()));
        let joined = args.join(" ");
        assert!(joined.contains("-vn -map 0:a:0 -c:a aac"));
        assert_eq!(args.last().unwrap(), "/tmp/job-temp-audio.m4a");
    }

    #[test]
    fn summary_uses_last_stderr_line() {
        let summary = failure_summary(
            "FFmpeg",
            "frame=  10\nin.mp4: Invalid data found when processing input\n\n",
            Some(1),
        );
        assert_eq!(summary, "FFmpeg failed (exit code 1): in.mp4: Invalid data found when processing input");
    }

    #[test]
    fn summary_without_stderr_or_code() {
        assert_eq!(failure_summary("ffprobe", "", Some(1)), "ffprobe failed (exit code 1)");
        assert_eq!(failure_summary("FFmpeg", "  \n", None), "FFmpeg was terminated");
    }

    #[test]
    fn long_lines_are_truncated() {
        let summary = failure_summary("FFmpeg", &"é".repeat(300), Some(1));
        assert!(summary.ends_with('…'));
        assert!(summary.len() < 300);
    }

    #[test]
    fn open_missing_file_reports_missing() {
        let backend = FfmpegBackend::new("ffmpeg", "ffprobe");
        let err = backend.open(Path::new("/definitely/not/here.mp4")).err().unwrap();
        assert!(matches!(err, MediaError::Missing(_)));
    }

    #[test]
    fn temp_audio_guard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x-temp-audio.m4a");
        fs::write(&path, b"aac").unwrap();
        drop(TempAudio(path.clone()));
        assert!(!path.exists());
    }
}
