//! EcoFull Cache Library
//!
//! Namespaced cache for rendered resource payloads with TTL expiration over
//! persistent, session-scoped and in-memory backends.

pub mod config;
pub mod disk;
pub mod entry;
pub mod error;
pub mod session;
pub mod storage;
pub mod store;

pub use config::{CacheBackend, CacheConfig, ConfigError};
pub use disk::FileStorage;
pub use entry::CacheEntry;
pub use error::CacheError;
pub use session::SessionStorage;
pub use storage::StorageArea;
pub use store::{CacheStats, CacheStore, Clock, ManualClock, SystemClock, NAMESPACE};
