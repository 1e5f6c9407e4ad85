use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const ARTIFACT_SUFFIX: &str = "_processed.mp4";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found")]
    NotFound,

    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Intake and output directories for a single service instance.
///
/// Both directories are created once at construction and treated as
/// read-only configuration afterwards.
#[derive(Clone, Debug)]
pub struct StorageService {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
}

impl StorageService {
    pub async fn new(
        upload_dir: impl Into<PathBuf>,
        processed_dir: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        let upload_dir = upload_dir.into();
        let processed_dir = processed_dir.into();

        tokio::fs::create_dir_all(&upload_dir).await?;
        tokio::fs::create_dir_all(&processed_dir).await?;

        info!(
            "✅ Storage ready (uploads: {}, processed: {})",
            upload_dir.display(),
            processed_dir.display()
        );

        Ok(Self {
            upload_dir,
            processed_dir,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Writes the uploaded bytes under a fresh identifier, keeping the
    /// original extension.
    pub async fn store_original(&self, bytes: Bytes, original_filename: &str) -> Result<Uuid, StorageError> {
        let file_id = Uuid::new_v4();
        let extension = extension_with_dot(original_filename);
        let path = self.upload_dir.join(format!("{}{}", file_id, extension));

        tokio::fs::write(&path, &bytes).await?;

        info!("Stored original {} ({} bytes) as {}", original_filename, bytes.len(), path.display());
        Ok(file_id)
    }

    /// Finds the stored original whose name starts with the identifier.
    /// With several matches the first one the directory listing yields wins.
    pub async fn resolve_original(&self, file_id: &Uuid) -> Result<PathBuf, StorageError> {
        let prefix = file_id.to_string();
        let mut entries = tokio::fs::read_dir(&self.upload_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) {
                return Ok(entry.path());
            }
        }

        Err(StorageError::NotFound)
    }

    pub fn artifact_path(&self, file_id: &Uuid) -> PathBuf {
        self.processed_dir.join(artifact_name(file_id))
    }

    /// Resolves a download name inside the output directory. Anything that is
    /// not a bare file name is treated as absent.
    pub async fn artifact_by_name(&self, filename: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_file_name(filename) {
            warn!("Rejected download name {:?}", filename);
            return Err(StorageError::NotFound);
        }

        let path = self.processed_dir.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::NotFound),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn artifact_name(file_id: &Uuid) -> String {
    format!("{}{}", file_id, ARTIFACT_SUFFIX)
}

/// Text after the last dot, kept only when it is plain alphanumerics.
fn extension_with_dot(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{}", ext)
        }
        _ => String::new(),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage(dir: &TempDir) -> StorageService {
        StorageService::new(dir.path().join("uploads"), dir.path().join("processed"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn new_creates_directories_idempotently() {
        let dir = TempDir::new().unwrap();
        let first = storage(&dir).await;
        let _second = storage(&dir).await;
        assert!(first.upload_dir().is_dir());
        assert!(first.processed_dir().is_dir());
    }

    #[tokio::test]
    async fn stored_original_resolves_to_same_bytes() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let payload = Bytes::from_static(b"not really a video");

        let id = storage.store_original(payload.clone(), "Holiday.MOV").await.unwrap();
        let path = storage.resolve_original(&id).await.unwrap();

        assert_eq!(path.file_name().unwrap().to_string_lossy(), format!("{}.MOV", id));
        assert_eq!(std::fs::read(&path).unwrap(), payload.to_vec());
    }

    #[tokio::test]
    async fn bare_dot_name_keeps_its_extension() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;

        let id = storage.store_original(Bytes::from_static(b"x"), ".mp4").await.unwrap();
        let path = storage.resolve_original(&id).await.unwrap();
        assert_eq!(path.file_name().unwrap().to_string_lossy(), format!("{}.mp4", id));

        let id = storage.store_original(Bytes::from_static(b"x"), "a.b/../c").await.unwrap();
        let path = storage.resolve_original(&id).await.unwrap();
        assert_eq!(path.parent().unwrap(), storage.upload_dir());
        assert_eq!(path.file_name().unwrap().to_string_lossy(), id.to_string());
    }

    #[tokio::test]
    async fn resolve_unknown_identifier_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let err = storage.resolve_original(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn resolve_tolerates_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let id = Uuid::new_v4();
        std::fs::write(storage.upload_dir().join(format!("{}.weird", id)), b"x").unwrap();

        let path = storage.resolve_original(&id).await.unwrap();
        assert!(path.to_string_lossy().ends_with(".weird"));
    }

    #[tokio::test]
    async fn artifact_path_uses_processed_suffix() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let id = Uuid::new_v4();
        let path = storage.artifact_path(&id);
        assert_eq!(path.parent().unwrap(), storage.processed_dir());
        assert_eq!(path.file_name().unwrap().to_string_lossy(), format!("{}_processed.mp4", id));
    }

    #[tokio::test]
    async fn artifact_by_name_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();

        for name in ["../secret.txt", "..", "a/b.mp4", ""] {
            let err = storage.artifact_by_name(name).await.unwrap_err();
            assert!(matches!(err, StorageError::NotFound), "{name}");
        }
    }

    #[tokio::test]
    async fn artifact_by_name_finds_existing_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let id = Uuid::new_v4();
        std::fs::write(storage.artifact_path(&id), b"mp4").unwrap();

        let path = storage.artifact_by_name(&artifact_name(&id)).await.unwrap();
        assert_eq!(path, storage.artifact_path(&id));
    }
}
