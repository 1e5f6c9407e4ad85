use super::model::{JobRecord, JobState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Per-process job states. Not persisted; a restart forgets everything and
/// jobs are rediscovered from the intake directory.
#[derive(Clone, Default)]
pub struct JobRepository {
    jobs: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, file_id: &Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(file_id).cloned()
    }

    pub async fn mark_uploaded(&self, file_id: Uuid) {
        self.set(file_id, JobState::Uploaded, None).await;
    }

    pub async fn mark_processing(&self, file_id: Uuid) {
        self.set(file_id, JobState::Processing, None).await;
    }

    pub async fn mark_processed(&self, file_id: Uuid) {
        self.set(file_id, JobState::Processed, None).await;
    }

    pub async fn mark_failed(&self, file_id: Uuid, error: String) {
        self.set(file_id, JobState::Failed, Some(error)).await;
    }

    async fn set(&self, file_id: Uuid, state: JobState, error: Option<String>) {
        let mut jobs = self.jobs.write().await;
        let previous = jobs.insert(file_id, JobRecord { state, error }).map(|r| r.state);
        debug!("Job {}: {:?} -> {:?}", file_id, previous, state);
    }
}
