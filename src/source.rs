//! Where frames and video metadata come from.
//!
//! Frames are addressed by a zero-padded five-digit name (`00042.jpg`) under
//! a base location, either an HTTP prefix or a local directory.

use serde::Deserialize;
use std::path::PathBuf;

/// Descriptor served alongside the frames (`video.json`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VideoMetadata {
    pub video_name: String,
    pub frame_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed video metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("invalid video metadata: {0}")]
    InvalidMetadata(String),

    #[error("cannot decode frame image: {0}")]
    Decode(#[from] image::ImageError),
}

pub fn frame_file_name(index: u32) -> String {
    format!("{index:05}.jpg")
}

pub fn parse_metadata(bytes: &[u8]) -> Result<VideoMetadata, FetchError> {
    let metadata: VideoMetadata = serde_json::from_slice(bytes)?;
    if metadata.frame_count == 0 {
        return Err(FetchError::InvalidMetadata(format!(
            "{} has no frames",
            metadata.video_name
        )));
    }
    Ok(metadata)
}

pub trait FrameSource: Send + Sync {
    fn metadata(&self) -> Result<VideoMetadata, FetchError>;

    /// Raw encoded image bytes of frame `index`.
    fn frame(&self, index: u32) -> Result<Vec<u8>, FetchError>;

    /// Human readable location, for the status bar.
    fn describe(&self) -> String;
}

// ── HTTP ────────────────────────────────────────────────────────────────────

pub struct HttpSource {
    client: reqwest::blocking::Client,
    video_url: String,
    frames_url: String,
}

impl HttpSource {
    pub fn new(video_url: impl Into<String>, frames_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            video_url: video_url.into(),
            frames_url: frames_url.into(),
        }
    }

    pub fn frame_url(&self, index: u32) -> String {
        format!(
            "{}/{}",
            self.frames_url.trim_end_matches('/'),
            frame_file_name(index)
        )
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

impl FrameSource for HttpSource {
    fn metadata(&self) -> Result<VideoMetadata, FetchError> {
        parse_metadata(&self.get(&self.video_url)?)
    }

    fn frame(&self, index: u32) -> Result<Vec<u8>, FetchError> {
        self.get(&self.frame_url(index))
    }

    fn describe(&self) -> String {
        self.frames_url.clone()
    }
}

// ── Local directory ─────────────────────────────────────────────────────────

/// A directory holding `video.json` next to the numbered frames.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub const METADATA_FILE: &'static str = "video.json";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}

impl FrameSource for DirectorySource {
    fn metadata(&self) -> Result<VideoMetadata, FetchError> {
        parse_metadata(&self.read(Self::METADATA_FILE)?)
    }

    fn frame(&self, index: u32) -> Result<Vec<u8>, FetchError> {
        self.read(&frame_file_name(index))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
