//! Session-scoped storage area
//!
//! Lives only as long as the process, but clones share the same items, so
//! several engines in one session see each other's entries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CacheError;
use crate::storage::StorageArea;

/// In-process string → string storage area with shared handles
#[derive(Debug, Clone, Default)]
pub struct SessionStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionStorage {
    /// Create a new, empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Check if the session holds no items
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl StorageArea for SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), CacheError> {
        self.items.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), CacheError> {
        self.items.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.items.lock().keys().cloned().collect())
    }
}
