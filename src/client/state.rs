use std::fmt;
use uuid::Uuid;

/// What the operator sees. Owned by a single [`ClientDriver`](super::ClientDriver).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientState {
    Idle,
    Uploaded {
        file_id: Uuid,
        file_name: String,
    },
    Processing {
        file_id: Uuid,
        file_name: String,
    },
    Done {
        file_id: Uuid,
        file_name: String,
        duration: f64,
        download_url: String,
    },
    Error {
        message: String,
        /// Kept so a failed job can be retried without a new upload.
        upload: Option<(Uuid, String)>,
    },
}

impl ClientState {
    /// The uploaded job the "process" action would act on, if any.
    pub fn uploaded_job(&self) -> Option<(Uuid, &str)> {
        match self {
            ClientState::Uploaded { file_id, file_name }
            | ClientState::Done { file_id, file_name, .. } => Some((*file_id, file_name)),
            ClientState::Error {
                upload: Some((file_id, file_name)),
                ..
            } => Some((*file_id, file_name)),
            ClientState::Idle | ClientState::Processing { .. } | ClientState::Error { upload: None, .. } => None,
        }
    }

    pub fn can_process(&self) -> bool {
        self.uploaded_job().is_some()
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Idle => write!(f, "Choose a video file"),
            ClientState::Uploaded { file_name, .. } => {
                write!(f, "File uploaded: {}. Ready to process.", file_name)
            }
            ClientState::Processing { .. } => write!(f, "Processing video..."),
            ClientState::Done { duration, download_url, .. } => {
                write!(f, "Processing complete! ({:.2}s) {}", duration, download_url)
            }
            ClientState::Error { message, .. } => write!(f, "Error: {}", message),
        }
    }
}
