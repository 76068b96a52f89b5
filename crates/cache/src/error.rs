//! Cache error types

/// Errors raised by storage areas and the cache store.
///
/// None of these ever reach an element's load state machine: the store turns
/// read failures into misses and drops failed writes.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("storage read failed: {0}")]
    Read(String),
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
