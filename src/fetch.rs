//! Background loading of metadata and frames.
//!
//! Every request runs on its own worker thread; results come back over a
//! channel and are drained by the UI thread once per repaint. Requests are
//! neither cancelled nor retried.

use eframe::egui;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::source::{FetchError, FrameSource, VideoMetadata};

pub enum FetchEvent {
    Metadata(Result<VideoMetadata, FetchError>),
    Frame {
        index: u32,
        result: Result<egui::ColorImage, FetchError>,
    },
}

/// Decodes encoded image bytes into pixels egui can upload.
pub fn decode_frame(bytes: &[u8]) -> Result<egui::ColorImage, FetchError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.as_flat_samples();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()))
}

pub struct Fetcher {
    source: Arc<dyn FrameSource>,
    tx: Sender<FetchEvent>,
    rx: Receiver<FetchEvent>,
    repaint: Option<egui::Context>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            repaint: None,
        }
    }

    /// Wakes `ctx` whenever a request completes.
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn source(&self) -> &dyn FrameSource {
        self.source.as_ref()
    }

    pub fn request_metadata(&self) {
        self.spawn(|source| FetchEvent::Metadata(source.metadata()));
    }

    pub fn request_frame(&self, index: u32) {
        tracing::debug!(index, "requesting frame");
        self.spawn(move |source| FetchEvent::Frame {
            index,
            result: source.frame(index).and_then(|bytes| decode_frame(&bytes)),
        });
    }

    /// Completed requests, oldest first. Never blocks.
    pub fn poll(&self) -> Vec<FetchEvent> {
        self.rx.try_iter().collect()
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&dyn FrameSource) -> FetchEvent + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        thread::spawn(move || {
            let event = job(source.as_ref());
            // The receiver only goes away when the app shuts down.
            if tx.send(event).is_ok() {
                if let Some(ctx) = repaint {
                    ctx.request_repaint();
                }
            }
        });
    }
}

// ── Frame cache ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum FrameSlot<T> {
    Loading,
    Ready(T),
}

/// Loaded frames by index, kept for the whole session.
#[derive(Debug)]
pub struct FrameCache<T> {
    slots: HashMap<u32, FrameSlot<T>>,
}

impl<T> Default for FrameCache<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<T> FrameCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `index` as loading. Returns false when it is already loading
    /// or loaded, in which case no request should be issued.
    pub fn begin(&mut self, index: u32) -> bool {
        if self.slots.contains_key(&index) {
            return false;
        }
        self.slots.insert(index, FrameSlot::Loading);
        true
    }

    /// Stores a finished load. A failure frees the slot so the next visit
    /// asks again.
    pub fn finish<E>(&mut self, index: u32, result: Result<T, E>) {
        match result {
            Ok(frame) => {
                self.slots.insert(index, FrameSlot::Ready(frame));
            }
            Err(_) => {
                self.slots.remove(&index);
            }
        }
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        match self.slots.get(&index) {
            Some(FrameSlot::Ready(frame)) => Some(frame),
            _ => None,
        }
    }

    pub fn is_loading(&self, index: u32) -> bool {
        matches!(self.slots.get(&index), Some(FrameSlot::Loading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct StubSource {
        image: Vec<u8>,
    }

    impl StubSource {
        fn new() -> Self {
            let mut image = Vec::new();
            image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
                .write_to(&mut std::io::Cursor::new(&mut image), image::ImageFormat::Png)
                .unwrap();
            Self { image }
        }
    }

    impl FrameSource for StubSource {
        fn metadata(&self) -> Result<VideoMetadata, FetchError> {
            Ok(VideoMetadata {
                video_name: "stub".into(),
                frame_count: 4,
            })
        }

        fn frame(&self, index: u32) -> Result<Vec<u8>, FetchError> {
            if index < 4 {
                Ok(self.image.clone())
            } else {
                Err(FetchError::Status {
                    url: format!("stub/{index}"),
                    status: 404,
                })
            }
        }

        fn describe(&self) -> String {
            "stub".into()
        }
    }

    fn wait_for(fetcher: &Fetcher, count: usize) -> Vec<FetchEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.len() < count && Instant::now() < deadline {
            events.extend(fetcher.poll());
            thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn decodes_png_bytes() {
        let image = decode_frame(&StubSource::new().image).unwrap();
        assert_eq!(image.size, [3, 2]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(decode_frame(b"nope"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn fetcher_delivers_metadata_and_frames() {
        let fetcher = Fetcher::new(Arc::new(StubSource::new()));
        fetcher.request_metadata();
        fetcher.request_frame(2);
        fetcher.request_frame(9);

        let events = wait_for(&fetcher, 3);
        assert_eq!(events.len(), 3);
        for event in events {
            match event {
                FetchEvent::Metadata(result) => assert_eq!(result.unwrap().frame_count, 4),
                FetchEvent::Frame { index: 2, result } => assert_eq!(result.unwrap().size, [3, 2]),
                FetchEvent::Frame { index, result } => {
                    assert_eq!(index, 9);
                    assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
                }
            }
        }
    }

    #[test]
    fn cache_issues_one_request_per_frame() {
        let mut cache: FrameCache<&str> = FrameCache::new();
        assert!(cache.begin(1));
        assert!(!cache.begin(1));
        assert!(cache.is_loading(1));
        assert_eq!(cache.get(1), None);

        cache.finish::<()>(1, Ok("frame one"));
        assert!(!cache.begin(1));
        assert_eq!(cache.get(1), Some(&"frame one"));
    }

    #[test]
    fn failed_load_can_be_requested_again() {
        let mut cache: FrameCache<&str> = FrameCache::new();
        assert!(cache.begin(5));
        cache.finish(5, Err("offline"));
        assert!(!cache.is_loading(5));
        assert!(cache.begin(5));
    }

    #[test]
    fn late_results_land_under_their_own_index() {
        let mut cache: FrameCache<&str> = FrameCache::new();
        cache.begin(1);
        cache.begin(2);
        cache.finish::<()>(1, Ok("one"));
        assert_eq!(cache.get(2), None);
        assert_eq!(cache.get(1), Some(&"one"));
    }
}
