#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use video_protect::AppConfig;
use video_protect::AppState;
use video_protect::infrastructure::media::{EncodeSettings, MediaBackend, MediaError, MediaSource, VideoInfo};

/// Leading bytes the fake backend treats as a decodable video.
pub const FAKE_VIDEO: &[u8] = b"FAKEVIDEO";

pub fn fake_video_bytes() -> Vec<u8> {
    let mut bytes = FAKE_VIDEO.to_vec();
    bytes.extend_from_slice(&[7u8; 512]);
    bytes
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Succeed,
    /// Writes part of the artifact, then reports an encoder error.
    FailMidWrite,
    /// Writes part of the artifact, then panics.
    PanicMidWrite,
    /// Reports success without producing a file.
    SilentNoOutput,
}

#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub size: (u32, u32),
    pub target: PathBuf,
    pub temp_audio: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
}

#[derive(Default)]
pub struct Counters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub writes: Mutex<Vec<WriteRecord>>,
}

impl Counters {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.writes.lock().unwrap().clone()
    }
}

pub struct FakeBackend {
    pub info: VideoInfo,
    pub mode: WriteMode,
    pub counters: Arc<Counters>,
}

impl FakeBackend {
    pub fn full_hd() -> Self {
        Self::with_info(VideoInfo {
            duration: 10.0,
            width: 1920,
            height: 1080,
            has_audio: true,
        })
    }

    pub fn with_info(info: VideoInfo) -> Self {
        Self {
            info,
            mode: WriteMode::Succeed,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }
}

impl MediaBackend for FakeBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn MediaSource>, MediaError> {
        let bytes = fs::read(path).map_err(|_| MediaError::Missing(path.to_path_buf()))?;
        if !bytes.starts_with(FAKE_VIDEO) {
            return Err(MediaError::Decode(format!(
                "{}: Invalid data found when processing input",
                path.display()
            )));
        }

        Ok(Box::new(FakeSource::acquire(
            self.info.clone(),
            (self.info.width, self.info.height),
            self.mode,
            self.counters.clone(),
        )))
    }
}

pub struct FakeSource {
    info: VideoInfo,
    size: (u32, u32),
    mode: WriteMode,
    counters: Arc<Counters>,
}

impl FakeSource {
    fn acquire(info: VideoInfo, size: (u32, u32), mode: WriteMode, counters: Arc<Counters>) -> Self {
        counters.acquired.fetch_add(1, Ordering::SeqCst);
        Self {
            info,
            size,
            mode,
            counters,
        }
    }
}

impl MediaSource for FakeSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    fn resized(&self, width: u32, height: u32) -> Result<Box<dyn MediaSource>, MediaError> {
        Ok(Box::new(FakeSource::acquire(
            self.info.clone(),
            (width, height),
            self.mode,
            self.counters.clone(),
        )))
    }

    fn write(&self, target: &Path, settings: &EncodeSettings) -> Result<(), MediaError> {
        self.counters.writes.lock().unwrap().push(WriteRecord {
            size: self.size,
            target: target.to_path_buf(),
            temp_audio: settings.temp_audio.clone(),
            video_codec: settings.video_codec.clone(),
            audio_codec: settings.audio_codec.clone(),
        });

        if self.mode == WriteMode::SilentNoOutput {
            return Ok(());
        }

        fs::write(target, b"ftypisom partial")?;

        match self.mode {
            WriteMode::FailMidWrite => Err(MediaError::Encode("simulated encoder crash".to_string())),
            WriteMode::PanicMidWrite => panic!("simulated encoder panic"),
            _ => {
                fs::write(target, format!("ftypisom {}x{} complete", self.size.0, self.size.1))?;
                Ok(())
            }
        }
    }
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestEnv {
    pub dir: TempDir,
    pub state: AppState,
    pub counters: Arc<Counters>,
}

impl TestEnv {
    pub async fn new(backend: FakeBackend) -> Self {
        Self::with_config(backend, |_| {}).await
    }

    pub async fn with_config(backend: FakeBackend, tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::with_root(dir.path());
        tweak(&mut config);

        let counters = backend.counters.clone();
        let state = AppState::with_backend(config, Arc::new(backend)).await.unwrap();

        Self { dir, state, counters }
    }

    pub fn upload_entries(&self) -> Vec<PathBuf> {
        list(self.state.storage.upload_dir())
    }

    pub fn processed_entries(&self) -> Vec<PathBuf> {
        list(self.state.storage.processed_dir())
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    entries.sort();
    entries
}

/// Minimal multipart/form-data body with one file field.
pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----video-protect-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (format!("multipart/form-data; boundary={}", boundary), body)
}
