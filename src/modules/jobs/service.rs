use super::dto::{JobStatusResponse, ProcessResponse, UploadResponse};
use super::error::JobError;
use super::model::{JobState, Resolution, accepted_extension};
use crate::infrastructure::storage::local::{StorageError, artifact_name};
use crate::state::AppState;
use crate::workers::transcoder::TranscodeJob;
use bytes::Bytes;
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

pub struct JobService;

impl JobService {
    /// Rejects names whose extension the service does not accept. Runs before
    /// any byte of the upload is read or written.
    pub fn check_format(filename: &str) -> Result<(), JobError> {
        accepted_extension(filename)
            .map(|_| ())
            .ok_or(JobError::UnsupportedFormat)
    }

    pub async fn upload(state: AppState, bytes: Bytes, filename: &str) -> Result<UploadResponse, JobError> {
        Self::check_format(filename)?;

        let file_id = state.storage.store_original(bytes, filename).await?;
        state.jobs.mark_uploaded(file_id).await;

        Ok(UploadResponse {
            file_id,
            original_filename: filename.to_string(),
        })
    }

    /// Transcodes the stored original. Re-running on a processed job redoes
    /// the work and overwrites the artifact.
    pub async fn process(state: AppState, file_id: &str, resolution: Resolution) -> Result<ProcessResponse, JobError> {
        let file_id = parse_file_id(file_id)?;
        let input = state.storage.resolve_original(&file_id).await?;

        let job = TranscodeJob {
            file_id,
            input,
            output: state.storage.artifact_path(&file_id),
            resolution,
        };

        state.jobs.mark_processing(file_id).await;

        match state.transcoder.run(job).await {
            Ok(outcome) => {
                state.jobs.mark_processed(file_id).await;
                info!("Job {} processed ({:.2}s source)", file_id, outcome.source_duration);

                Ok(ProcessResponse {
                    status: "success".to_string(),
                    original_duration: outcome.source_duration,
                    processed_file: format!("/download/{}", artifact_name(&file_id)),
                })
            }
            Err(e) => {
                let err = JobError::from(e);
                error!("❌ Job {} failed: {}", file_id, err);
                state.jobs.mark_failed(file_id, err.to_string()).await;
                Err(err)
            }
        }
    }

    pub async fn artifact(state: AppState, filename: &str) -> Result<PathBuf, JobError> {
        Ok(state.storage.artifact_by_name(filename).await?)
    }

    pub async fn status(state: AppState, file_id: &str) -> Result<JobStatusResponse, JobError> {
        let file_id = parse_file_id(file_id)?;

        if let Some(record) = state.jobs.get(&file_id).await {
            return Ok(JobStatusResponse {
                file_id,
                state: record.state,
                error: record.error,
            });
        }

        // Unknown to this process but still on disk, e.g. after a restart.
        match state.storage.resolve_original(&file_id).await {
            Ok(_) => {
                let processed = tokio::fs::try_exists(state.storage.artifact_path(&file_id)).await?;
                Ok(JobStatusResponse {
                    file_id,
                    state: if processed { JobState::Processed } else { JobState::Uploaded },
                    error: None,
                })
            }
            Err(StorageError::NotFound) => Err(JobError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Identifiers are UUIDs; anything else cannot name a job.
fn parse_file_id(raw: &str) -> Result<Uuid, JobError> {
    Uuid::parse_str(raw).map_err(|_| JobError::NotFound)
}
