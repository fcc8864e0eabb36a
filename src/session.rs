use crate::source::VideoMetadata;

/// Which video is open and which frame is on screen.
#[derive(Debug, Default)]
pub struct Session {
    metadata: Option<VideoMetadata>,
    load_error: Option<String>,
    current: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_metadata(&mut self, metadata: VideoMetadata) {
        tracing::info!(
            video = %metadata.video_name,
            frames = metadata.frame_count,
            "video metadata loaded"
        );
        self.current = self.current.min(metadata.frame_count.saturating_sub(1));
        self.metadata = Some(metadata);
        self.load_error = None;
    }

    pub fn set_load_error(&mut self, message: String) {
        self.load_error = Some(message);
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    pub fn current_frame(&self) -> u32 {
        self.current
    }

    pub fn frame_count(&self) -> Option<u32> {
        self.metadata.as_ref().map(|m| m.frame_count)
    }

    pub fn can_go_previous(&self) -> bool {
        self.metadata.is_some() && self.current > 0
    }

    pub fn can_go_next(&self) -> bool {
        matches!(self.frame_count(), Some(count) if self.current + 1 < count)
    }

    /// Steps back one frame. Returns whether the frame changed.
    pub fn previous(&mut self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Steps forward one frame. Returns whether the frame changed.
    pub fn next(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn title(&self) -> String {
        match (&self.metadata, &self.load_error) {
            (Some(metadata), _) => metadata.video_name.clone(),
            (None, Some(err)) => format!("Video unavailable: {err}"),
            (None, None) => "Loading video…".to_owned(),
        }
    }
}
