//! String-keyed storage areas
//!
//! A storage area is a flat string → string map shared with unrelated data,
//! which is why the cache store namespaces every key it writes.

use crate::error::CacheError;

/// Backing store for the serialized cache backends
pub trait StorageArea: Send {
    /// Read the raw value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: String) -> Result<(), CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), CacheError>;

    /// All keys currently stored, including ones this crate did not write
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}
