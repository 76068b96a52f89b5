//! Persistent storage area backed by a JSON document on disk.
//!
//! All items live in a single `storage.json` file inside the cache directory.
//! The document is loaded once when the area is opened and written through on
//! every mutation, so reads never touch the disk.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::CacheError;
use crate::storage::StorageArea;

const DOCUMENT_NAME: &str = "storage.json";

/// Persistent string → string storage area
///
/// # Example
///
/// ```
/// use ecofull_cache::{FileStorage, StorageArea};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut storage = FileStorage::open(dir.path()).unwrap();
/// storage.set_item("greeting", "hello".to_string()).unwrap();
///
/// let reopened = FileStorage::open(dir.path()).unwrap();
/// assert_eq!(reopened.get_item("greeting").unwrap().as_deref(), Some("hello"));
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open (or create) the storage document inside `dir`
    ///
    /// A document that exists but cannot be parsed is discarded and the area
    /// starts empty; the next write replaces it.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, CacheError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(DOCUMENT_NAME);
        let items = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(items) => items,
                Err(e) => {
                    warn!("discarding unreadable storage document {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, items })
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the area holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn flush(&self) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(&self.items)?;

        // Write beside the document and rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| CacheError::Write(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| CacheError::Write(e.to_string()))?;
        Ok(())
    }
}

impl StorageArea for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), CacheError> {
        let previous = self.items.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            // Keep the mirror consistent with what is on disk
            match previous {
                Some(previous) => self.items.insert(key.to_string(), previous),
                None => self.items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), CacheError> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.items.keys().cloned().collect())
    }
}
