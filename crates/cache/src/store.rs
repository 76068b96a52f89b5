//! Namespaced content cache with TTL expiration
//!
//! Every key is stored under [`NAMESPACE`] so the cache can share a storage
//! area with unrelated data and `clear()` only ever removes its own entries.
//! Expiration is checked on every read; there is no background sweep.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::config::{CacheBackend, CacheConfig};
use crate::disk::FileStorage;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::session::SessionStorage;
use crate::storage::StorageArea;

/// Prefix applied to every key written by the store
pub const NAMESPACE: &str = "ecofull:";

/// Source of "now" for entry timestamps
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Set the clock to an absolute time
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of reads that returned content
    pub hits: u64,

    /// Number of reads that returned nothing (including expired and corrupt)
    pub misses: u64,

    /// Number of entries purged on read because their TTL elapsed
    pub expirations: u64,

    /// Number of stored values that could not be parsed or read
    pub corrupt_reads: u64,

    /// Number of writes the backend rejected
    pub failed_writes: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

enum Backend {
    /// Entries serialized to the wire shape inside a storage area
    Serialized(Box<dyn StorageArea>),
    /// Typed entries, keyed by namespaced key
    Memory(HashMap<String, CacheEntry>),
}

/// Content cache over a selectable backend
///
/// # Example
///
/// ```
/// use ecofull_cache::CacheStore;
///
/// let mut cache = CacheStore::memory();
/// cache.set("photo.jpg", "<img src=\"photo.webp\">");
/// assert_eq!(cache.get("photo.jpg").as_deref(), Some("<img src=\"photo.webp\">"));
///
/// cache.delete("photo.jpg");
/// assert!(cache.get("photo.jpg").is_none());
/// ```
pub struct CacheStore {
    backend: Backend,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl CacheStore {
    /// Create a store with typed in-memory entries
    pub fn memory() -> Self {
        Self::with_backend(Backend::Memory(HashMap::new()))
    }

    /// Create a store over a string storage area
    pub fn with_storage(area: Box<dyn StorageArea>) -> Self {
        Self::with_backend(Backend::Serialized(area))
    }

    /// Create a store for `config`
    ///
    /// The session backend gets a fresh [`SessionStorage`]; to share one
    /// between stores, build them with [`CacheStore::with_storage`].
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let store = match config.backend {
            CacheBackend::Persistent => {
                Self::with_storage(Box::new(FileStorage::open(&config.storage_dir)?))
            }
            CacheBackend::Session => Self::with_storage(Box::new(SessionStorage::new())),
            CacheBackend::Memory => Self::memory(),
        };
        Ok(store.with_ttl(config.ttl))
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            ttl: None,
            clock: Arc::new(SystemClock),
            stats: CacheStats::default(),
        }
    }

    /// Set the entry TTL (`None` never expires)
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Replace the clock used for timestamps and expiry
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured TTL
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Namespaced form of `key`
    pub fn namespaced(key: &str) -> String {
        format!("{NAMESPACE}{key}")
    }

    /// Look up `key`
    ///
    /// Expired entries are deleted and reported as absent. Unreadable or
    /// malformed stored values are reported as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let full_key = Self::namespaced(key);
        let now = self.clock.now_millis();

        let entry = match self.read_entry(&full_key) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("cache read for {} treated as miss: {}", key, e);
                self.stats.corrupt_reads += 1;
                None
            }
        };

        match entry {
            Some(entry) if entry.is_expired(now, self.ttl) => {
                debug!("cache entry {} expired after {} ms", key, entry.age_ms(now));
                self.remove_full_key(&full_key);
                self.stats.expirations += 1;
                self.stats.misses += 1;
                None
            }
            Some(entry) => {
                self.stats.hits += 1;
                Some(entry.content)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store `content` under `key`, stamped with the current time
    ///
    /// A write the backend rejects is dropped.
    pub fn set(&mut self, key: &str, content: impl Into<String>) {
        let full_key = Self::namespaced(key);
        let entry = CacheEntry::new(content, self.clock.now_millis());

        let result = match &mut self.backend {
            Backend::Memory(entries) => {
                entries.insert(full_key, entry);
                Ok(())
            }
            Backend::Serialized(area) => entry
                .to_json()
                .map_err(CacheError::from)
                .and_then(|raw| area.set_item(&full_key, raw)),
        };

        if let Err(e) = result {
            warn!("dropping cache write for {}: {}", key, e);
            self.stats.failed_writes += 1;
        }
    }

    /// Remove `key`
    pub fn delete(&mut self, key: &str) {
        let full_key = Self::namespaced(key);
        self.remove_full_key(&full_key);
    }

    /// Remove every namespaced entry, leaving foreign keys untouched
    ///
    /// Returns the number of entries removed.
    pub fn clear(&mut self) -> usize {
        match &mut self.backend {
            Backend::Memory(entries) => {
                let count = entries.len();
                entries.clear();
                count
            }
            Backend::Serialized(area) => {
                let keys = match area.keys() {
                    Ok(keys) => keys,
                    Err(e) => {
                        warn!("unable to list cache keys: {}", e);
                        return 0;
                    }
                };

                let mut removed = 0;
                for key in keys.iter().filter(|k| k.starts_with(NAMESPACE)) {
                    match area.remove_item(key) {
                        Ok(()) => removed += 1,
                        Err(e) => warn!("unable to remove cache entry {}: {}", key, e),
                    }
                }
                removed
            }
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn read_entry(&self, full_key: &str) -> Result<Option<CacheEntry>, CacheError> {
        match &self.backend {
            Backend::Memory(entries) => Ok(entries.get(full_key).cloned()),
            Backend::Serialized(area) => match area.get_item(full_key)? {
                Some(raw) => Ok(Some(CacheEntry::from_json(&raw)?)),
                None => Ok(None),
            },
        }
    }

    fn remove_full_key(&mut self, full_key: &str) {
        match &mut self.backend {
            Backend::Memory(entries) => {
                entries.remove(full_key);
            }
            Backend::Serialized(area) => {
                if let Err(e) = area.remove_item(full_key) {
                    warn!("unable to remove cache entry {}: {}", full_key, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Storage area whose every operation fails
    struct BrokenStorage;

    impl StorageArea for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Read("quota".to_string()))
        }

        fn set_item(&mut self, _key: &str, _value: String) -> Result<(), CacheError> {
            Err(CacheError::Write("quota exceeded".to_string()))
        }

        fn remove_item(&mut self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Write("read only".to_string()))
        }

        fn keys(&self) -> Result<Vec<String>, CacheError> {
            Err(CacheError::Read("quota".to_string()))
        }
    }

    fn backends() -> Vec<CacheStore> {
        vec![
            CacheStore::memory(),
            CacheStore::with_storage(Box::new(SessionStorage::new())),
        ]
    }

    #[test]
    fn test_round_trip_without_ttl() {
        for mut cache in backends() {
            cache.set("photo.jpg", "rendered");
            assert_eq!(cache.get("photo.jpg").as_deref(), Some("rendered"));
        }
    }

    #[test]
    fn test_cache_miss() {
        for mut cache in backends() {
            assert!(cache.get("nothing").is_none());
            assert_eq!(cache.stats().misses, 1);
        }
    }

    #[test]
    fn test_ttl_expiry_purges_entry() {
        let session = SessionStorage::new();
        let clock = ManualClock::new(10_000);
        let mut cache = CacheStore::with_storage(Box::new(session.clone()))
            .with_ttl(Some(Duration::from_secs(5)))
            .with_clock(Arc::new(clock.clone()));

        cache.set("photo.jpg", "rendered");
        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.get("photo.jpg").as_deref(), Some("rendered"));

        clock.advance(Duration::from_millis(1));
        assert!(cache.get("photo.jpg").is_none());
        assert!(session.is_empty(), "expired entry should be purged");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_set_restamps_entry() {
        let clock = ManualClock::new(0);
        let mut cache = CacheStore::memory()
            .with_ttl(Some(Duration::from_millis(100)))
            .with_clock(Arc::new(clock.clone()));

        cache.set("k", "old");
        clock.advance(Duration::from_millis(80));
        cache.set("k", "new");
        clock.advance(Duration::from_millis(80));

        assert_eq!(cache.get("k").as_deref(), Some("new"));
    }

    #[test]
    fn test_keys_are_namespaced() {
        let session = SessionStorage::new();
        let mut cache = CacheStore::with_storage(Box::new(session.clone()));
        cache.set("photo.jpg", "rendered");

        let keys = session.keys().unwrap();
        assert_eq!(keys, vec!["ecofull:photo.jpg".to_string()]);
        assert_eq!(CacheStore::namespaced("a"), "ecofull:a");
    }

    #[test]
    fn test_corrupt_value_is_a_miss() {
        let mut session = SessionStorage::new();
        session
            .set_item("ecofull:photo.jpg", "{\"content\":".to_string())
            .unwrap();

        let mut cache = CacheStore::with_storage(Box::new(session));
        assert!(cache.get("photo.jpg").is_none());
        assert_eq!(cache.stats().corrupt_reads, 1);
    }

    #[test]
    fn test_clear_keeps_foreign_keys() {
        let mut session = SessionStorage::new();
        session.set_item("theme", "dark".to_string()).unwrap();

        let mut cache = CacheStore::with_storage(Box::new(session.clone()));
        cache.set("a.jpg", "a");
        cache.set("b.mp4", "b");

        assert_eq!(cache.clear(), 2);
        assert!(cache.get("a.jpg").is_none());
        assert_eq!(session.get_item("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_backend_failures_are_absorbed() {
        let mut cache = CacheStore::with_storage(Box::new(BrokenStorage));

        cache.set("a.jpg", "a");
        assert!(cache.get("a.jpg").is_none());
        cache.delete("a.jpg");
        assert_eq!(cache.clear(), 0);

        let stats = cache.stats();
        assert_eq!(stats.failed_writes, 1);
        assert_eq!(stats.corrupt_reads, 1);
    }

    #[test]
    fn test_open_persistent_backend() {
        let temp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_storage_dir(temp.path());

        let mut cache = CacheStore::open(&config).unwrap();
        cache.set("photo.jpg", "rendered");
        drop(cache);

        let mut reopened = CacheStore::open(&config).unwrap();
        assert_eq!(reopened.get("photo.jpg").as_deref(), Some("rendered"));
    }

    #[test]
    fn test_open_applies_ttl() {
        let config = CacheConfig::default()
            .with_backend(CacheBackend::Memory)
            .with_ttl(Some(Duration::from_secs(1)));

        let cache = CacheStore::open(&config).unwrap();
        assert_eq!(cache.ttl(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = CacheStore::memory();
        cache.set("a", "1");
        cache.get("a");
        cache.get("b");
        assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
