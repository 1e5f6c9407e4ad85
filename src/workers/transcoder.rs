use crate::infrastructure::media::{EncodeSettings, MediaBackend, MediaError, MediaSource};
use crate::modules::jobs::model::Resolution;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub file_id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeOutcome {
    pub source_duration: f64,
    pub artifact: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Input file not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Could not decode video: {0}")]
    DecodeError(String),

    #[error("{0}")]
    ProcessingFailed(String),
}

/// Drives the media backend for one job at a time per call. Cheap to clone.
#[derive(Clone)]
pub struct Transcoder {
    backend: Arc<dyn MediaBackend>,
    temp_dir: PathBuf,
}

impl Transcoder {
    pub fn new(backend: Arc<dyn MediaBackend>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            temp_dir: temp_dir.into(),
        }
    }

    /// Audio side file for a job. Keyed by the identifier so concurrent jobs
    /// never share one.
    pub fn temp_audio_path(&self, file_id: &Uuid) -> PathBuf {
        self.temp_dir.join(format!("{}-temp-audio.m4a", file_id))
    }

    /// Runs the transcode on the blocking pool.
    pub async fn run(&self, job: TranscodeJob) -> Result<TranscodeOutcome, TranscodeError> {
        let transcoder = self.clone();
        let file_id = job.file_id;

        match tokio::task::spawn_blocking(move || transcoder.transcode(&job)).await {
            Ok(result) => result,
            Err(e) => {
                error!("❌ Transcode task for {} aborted: {}", file_id, e);
                Err(TranscodeError::ProcessingFailed(format!("Transcode task aborted: {}", e)))
            }
        }
    }

    /// Blocking transcode. The source and any resized handle are released on
    /// every exit path, and a partially written artifact never survives a
    /// failed encode.
    pub fn transcode(&self, job: &TranscodeJob) -> Result<TranscodeOutcome, TranscodeError> {
        if !job.input.is_file() {
            return Err(TranscodeError::InputMissing(job.input.clone()));
        }

        info!("🎥 Transcoding {} at {}", job.file_id, job.resolution);

        let source = self.backend.open(&job.input).map_err(|e| match e {
            MediaError::Missing(path) => TranscodeError::InputMissing(path),
            other => TranscodeError::DecodeError(other.to_string()),
        })?;
        let info = source.info().clone();

        let (width, height) = job.resolution.target_dimensions(info.width, info.height);
        let resized = if (width, height) != source.dimensions() {
            Some(source.resized(width, height).map_err(processing_failed)?)
        } else {
            None
        };
        let output: &dyn MediaSource = resized.as_deref().unwrap_or(&*source);

        fs::create_dir_all(&self.temp_dir).map_err(|e| {
            TranscodeError::ProcessingFailed(format!("Failed to prepare temp dir: {}", e))
        })?;
        let settings = EncodeSettings::h264_aac(self.temp_audio_path(&job.file_id));

        let artifact = PartialArtifact::arm(&job.output);
        output.write(&job.output, &settings).map_err(processing_failed)?;
        if !job.output.is_file() {
            return Err(TranscodeError::ProcessingFailed(
                "Encoder finished without producing output".to_string(),
            ));
        }
        artifact.keep();

        info!(
            "✅ Transcoded {} to {}x{} ({:.2}s) -> {}",
            job.file_id,
            width,
            height,
            info.duration,
            job.output.display()
        );

        Ok(TranscodeOutcome {
            source_duration: info.duration,
            artifact: job.output.clone(),
            width,
            height,
        })
    }
}

fn processing_failed(e: MediaError) -> TranscodeError {
    TranscodeError::ProcessingFailed(e.to_string())
}

/// Deletes the artifact path on drop unless the write was confirmed.
struct PartialArtifact<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> PartialArtifact<'a> {
    fn arm(path: &'a Path) -> Self {
        Self { path, armed: true }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialArtifact<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(self.path) {
            Ok(()) => warn!("Removed partial artifact {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("Failed to remove partial artifact {}: {}", self.path.display(), e),
        }
    }
}
