//! Durable key-value storage backing the annotation store.
//!
//! Mirrors the browser `localStorage` contract: string keys, string values,
//! whole values replaced on write.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to write storage file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode storage contents: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, text: String) -> Result<(), StorageError>;
}

/// In-process storage. Nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, text: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), text);
        Ok(())
    }
}

/// A JSON object file holding every key. The file is read once on open and
/// rewritten in full on each `set`.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens `path`. A missing or unreadable file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring unreadable storage file");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot read storage file");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a sibling temporary file and renames it over the target,
    /// so an interrupted write never leaves a half-written file behind.
    fn flush(&self) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(&self.entries)?;
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(data.as_bytes()).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, text: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), text);
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_replaces_values() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("k"), None);
        storage.set("k", "one".into()).unwrap();
        storage.set("k", "two".into()).unwrap();
        assert_eq!(storage.get("k").as_deref(), Some("two"));
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut storage = FileStorage::open(&path);
        assert_eq!(storage.get("k"), None);
        storage.set("k", "value".into()).unwrap();
        storage.set("other", "x".into()).unwrap();

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get("k").as_deref(), Some("value"));
        assert_eq!(reopened.get("other").as_deref(), Some("x"));
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json at all").unwrap();

        let mut storage = FileStorage::open(&path);
        assert_eq!(storage.get("k"), None);
        storage.set("k", "v".into()).unwrap();
        assert_eq!(FileStorage::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn writes_replace_the_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"k":"old"}"#).unwrap();

        let mut storage = FileStorage::open(&path);
        assert_eq!(storage.get("k").as_deref(), Some("old"));
        for n in 0..3 {
            storage.set("k", format!("value {n}")).unwrap();
        }

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("storage.json")]);
        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["k"], "value 2");
    }

    #[test]
    fn unwritable_path_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be.
        let mut storage = FileStorage::open(dir.path());
        let err = storage.set("k", "v".into()).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
