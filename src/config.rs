use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::source::{DirectorySource, FrameSource, HttpSource};

pub const DEFAULT_VIDEO_URL: &str =
    "http://invisai-frontend-interview-data.s3-website-us-west-2.amazonaws.com/video.json";
pub const DEFAULT_FRAMES_URL: &str =
    "http://invisai-frontend-interview-data.s3-website-us-west-2.amazonaws.com/frames";

const APP_DIR: &str = "frame-labeler";
const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Parser)]
#[command(name = "frame-labeler", version, about = "Draw bounding boxes on video frames")]
pub struct Args {
    /// URL of the video descriptor (name and frame count)
    #[arg(long, default_value = DEFAULT_VIDEO_URL)]
    pub video_url: String,

    /// Base URL the numbered frames live under
    #[arg(long, default_value = DEFAULT_FRAMES_URL)]
    pub frames_url: String,

    /// Read video.json and frames from a local directory instead
    #[arg(long, conflicts_with_all = ["video_url", "frames_url"])]
    pub frames_dir: Option<PathBuf>,

    /// File annotations are kept in
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "frame_labeler=info")]
    pub log_filter: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSettings {
    Http {
        video_url: String,
        frames_url: String,
    },
    Directory(PathBuf),
}

impl SourceSettings {
    pub fn build(&self) -> Arc<dyn FrameSource> {
        match self {
            SourceSettings::Http {
                video_url,
                frames_url,
            } => Arc::new(HttpSource::new(video_url.clone(), frames_url.clone())),
            SourceSettings::Directory(root) => Arc::new(DirectorySource::new(root.clone())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub source: SourceSettings,
    /// `None` when no data directory could be found; annotations then only
    /// live as long as the process.
    pub storage_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Settings {
    pub fn from_args(args: Args) -> Self {
        let source = match args.frames_dir {
            Some(dir) => SourceSettings::Directory(dir),
            None => SourceSettings::Http {
                video_url: args.video_url,
                frames_url: args.frames_url,
            },
        };
        let storage_path = args.storage.or_else(default_storage_path);
        Self {
            source,
            storage_path,
            log_filter: args.log_filter,
        }
    }
}

fn default_storage_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR).join(STORAGE_FILE))
}
