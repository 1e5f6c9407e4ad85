use crate::config::settings::AppConfig;
use crate::infrastructure::media::{FfmpegBackend, MediaBackend};
use crate::infrastructure::storage::local::StorageService;
use crate::modules::jobs::repository::JobRepository;
use crate::workers::transcoder::Transcoder;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: StorageService,
    pub transcoder: Transcoder,
    pub jobs: JobRepository,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: StorageService,
        transcoder: Transcoder,
        jobs: JobRepository,
    ) -> Self {
        Self {
            config,
            storage,
            transcoder,
            jobs,
        }
    }

    /// Builds the state around `backend`, creating the storage directories.
    pub async fn with_backend(config: AppConfig, backend: Arc<dyn MediaBackend>) -> anyhow::Result<Self> {
        let storage = StorageService::new(&config.upload_dir, &config.processed_dir).await?;
        tokio::fs::create_dir_all(&config.temp_dir).await?;
        let transcoder = Transcoder::new(backend, config.temp_dir.clone());

        Ok(Self::new(config, storage, transcoder, JobRepository::new()))
    }

    /// Production state backed by the ffmpeg/ffprobe binaries from config.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let backend = Arc::new(FfmpegBackend::new(&config.ffmpeg_path, &config.ffprobe_path));
        Self::with_backend(config, backend).await
    }
}
