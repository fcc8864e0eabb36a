//! Per-frame bounding box store.
//!
//! The in-memory [`AnnotationCache`] is authoritative for the session and is
//! mirrored in full to the key-value storage after every mutation.

use crate::annotation::{AnnotationCache, BoundingBox};
use crate::storage::KeyValueStorage;

/// Storage key the whole cache is written under.
pub const STORAGE_KEY: &str = "bounding-boxes-cache";

pub struct AnnotationStore {
    cache: AnnotationCache,
    storage: Box<dyn KeyValueStorage>,
}

impl AnnotationStore {
    /// Empty store on top of `storage`. Call [`hydrate`](Self::hydrate) to
    /// pick up what a previous session left behind.
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            cache: AnnotationCache::new(),
            storage,
        }
    }

    /// Store hydrated from `storage`.
    pub fn open(storage: Box<dyn KeyValueStorage>) -> Self {
        let mut store = Self::new(storage);
        store.hydrate();
        store
    }

    /// Replaces the in-memory cache with the stored payload. A missing or
    /// malformed payload leaves the cache empty.
    pub fn hydrate(&mut self) {
        self.cache = match self.storage.get(STORAGE_KEY) {
            None => AnnotationCache::new(),
            Some(text) => match serde_json::from_str(&text) {
                Ok(cache) => cache,
                Err(err) => {
                    tracing::warn!(%err, "stored annotations are malformed, starting empty");
                    AnnotationCache::new()
                }
            },
        };
        tracing::info!(frames = self.cache.len(), "annotations hydrated");
    }

    pub fn get_boxes(&self, frame: u32) -> &[BoundingBox] {
        self.cache.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends `bbox` to the frame's boxes. The box is not validated.
    pub fn commit_box(&mut self, frame: u32, bbox: BoundingBox) -> &[BoundingBox] {
        self.cache.entry(frame).or_default().push(bbox);
        tracing::info!(frame, ?bbox, "box committed");
        self.persist();
        self.get_boxes(frame)
    }

    /// Removes the box at `index`. Out-of-range indices are ignored.
    pub fn delete_box(&mut self, frame: u32, index: usize) -> &[BoundingBox] {
        let removed = match self.cache.get_mut(&frame) {
            Some(boxes) if index < boxes.len() => {
                boxes.remove(index);
                true
            }
            _ => false,
        };
        if removed {
            tracing::info!(frame, index, "box deleted");
            self.persist();
        } else {
            tracing::debug!(frame, index, "delete ignored, no such box");
        }
        self.get_boxes(frame)
    }

    pub fn snapshot(&self) -> &AnnotationCache {
        &self.cache
    }

    /// Number of frames holding at least one box.
    pub fn annotated_frames(&self) -> usize {
        self.cache.values().filter(|boxes| !boxes.is_empty()).count()
    }

    fn persist(&mut self) {
        let text = match serde_json::to_string(&self.cache) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(%err, "cannot encode annotations");
                return;
            }
        };
        if let Err(err) = self.storage.set(STORAGE_KEY, text) {
            tracing::error!(%err, "cannot persist annotations");
        }
    }
}
