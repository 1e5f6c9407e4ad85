use super::state::ClientState;
use crate::common::response::ErrorResponse;
use crate::modules::jobs::dto::{ProcessResponse, UploadResponse};
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

pub type StateCallback = Box<dyn FnMut(&ClientState) + Send>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Upload a video before processing")]
    NotReady,

    #[error("Nothing to download yet")]
    NothingToDownload,

    /// Message from the service, passed through untouched.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sequences upload, process and download against the service and reports
/// every state change to the view callback.
pub struct ClientDriver {
    http: reqwest::Client,
    base: Url,
    state: ClientState,
    on_change: Option<StateCallback>,
}

impl ClientDriver {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            state: ClientState::Idle,
            on_change: None,
        })
    }

    pub fn on_change(mut self, callback: impl FnMut(&ClientState) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    fn transition(&mut self, next: ClientState) {
        debug!("Client state: {:?} -> {:?}", self.state, next);
        self.state = next;
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.state);
        }
    }

    fn fail(&mut self, err: ClientError, upload: Option<(Uuid, String)>) -> ClientError {
        self.transition(ClientState::Error {
            message: err.to_string(),
            upload,
        });
        err
    }

    pub async fn upload(&mut self, path: &Path) -> Result<Uuid, ClientError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(e.into(), None)),
        };

        self.upload_bytes(bytes, &file_name).await
    }

    pub async fn upload_bytes(&mut self, bytes: Vec<u8>, file_name: &str) -> Result<Uuid, ClientError> {
        match self.send_upload(bytes, file_name).await {
            Ok(res) => {
                info!("Uploaded {} as {}", file_name, res.file_id);
                self.transition(ClientState::Uploaded {
                    file_id: res.file_id,
                    file_name: file_name.to_string(),
                });
                Ok(res.file_id)
            }
            Err(e) => Err(self.fail(e, None)),
        }
    }

    async fn send_upload(&self, bytes: Vec<u8>, file_name: &str) -> Result<UploadResponse, ClientError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(self.base.join("upload/")?)
            .multipart(form)
            .send()
            .await?;

        parse_json(resp).await
    }

    /// Triggers the transcode for the last successful upload.
    pub async fn process(&mut self, resolution: &str) -> Result<ProcessResponse, ClientError> {
        let (file_id, file_name) = match self.state.uploaded_job() {
            Some((id, name)) => (id, name.to_string()),
            None => return Err(ClientError::NotReady),
        };

        self.transition(ClientState::Processing {
            file_id,
            file_name: file_name.clone(),
        });

        match self.send_process(file_id, resolution).await {
            Ok((res, download_url)) => {
                self.transition(ClientState::Done {
                    file_id,
                    file_name,
                    duration: res.original_duration,
                    download_url: download_url.to_string(),
                });
                Ok(res)
            }
            Err(e) => Err(self.fail(e, Some((file_id, file_name)))),
        }
    }

    async fn send_process(&self, file_id: Uuid, resolution: &str) -> Result<(ProcessResponse, Url), ClientError> {
        let resp = self
            .http
            .get(self.base.join(&format!("process/{}", file_id))?)
            .query(&[("resolution", resolution)])
            .send()
            .await?;

        let res: ProcessResponse = parse_json(resp).await?;
        let download_url = self.base.join(res.processed_file.trim_start_matches('/'))?;
        Ok((res, download_url))
    }

    /// Saves the processed video to `dest`, returning the byte count.
    pub async fn download(&mut self, dest: &Path) -> Result<u64, ClientError> {
        let ClientState::Done { download_url, .. } = &self.state else {
            return Err(ClientError::NothingToDownload);
        };
        let url = Url::parse(download_url)?;

        match self.fetch_to(url, dest).await {
            Ok(written) => {
                info!("Saved {} bytes to {}", written, dest.display());
                Ok(written)
            }
            Err(e) => {
                let upload = self.state.uploaded_job().map(|(id, name)| (id, name.to_string()));
                Err(self.fail(e, upload))
            }
        }
    }

    async fn fetch_to(&self, url: Url, dest: &Path) -> Result<u64, ClientError> {
        let mut resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Upload, process and download in one go.
    pub async fn run(&mut self, input: &Path, resolution: &str, dest: Option<PathBuf>) -> Result<PathBuf, ClientError> {
        self.upload(input).await?;
        let res = self.process(resolution).await?;

        let dest = dest.unwrap_or_else(|| {
            let name = res.processed_file.rsplit('/').next().unwrap_or("processed_video.mp4");
            PathBuf::from(name)
        });
        self.download(&dest).await?;
        Ok(dest)
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    Ok(resp.json::<T>().await?)
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status();
    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
    };
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
