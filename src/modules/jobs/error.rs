use crate::common::response::ApiError;
use crate::infrastructure::storage::local::StorageError;
use crate::workers::transcoder::TranscodeError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Only video files are allowed")]
    UnsupportedFormat,

    #[error("File not found")]
    NotFound,

    #[error("Error processing video: {0}")]
    Transcode(TranscodeError),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::UnsupportedFormat => StatusCode::BAD_REQUEST,
            JobError::NotFound => StatusCode::NOT_FOUND,
            JobError::Transcode(_) | JobError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for JobError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => JobError::NotFound,
            StorageError::Io(io) => JobError::Io(io),
        }
    }
}

impl From<TranscodeError> for JobError {
    fn from(e: TranscodeError) -> Self {
        JobError::Transcode(e)
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        ApiError(e.to_string(), e.status_code())
    }
}
