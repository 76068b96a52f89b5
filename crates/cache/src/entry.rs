//! Cache entry wire shape
//!
//! Entries are stored as `{ "content": string, "timestamp": ms-since-epoch }`
//! in the serialized backends.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached rendered payload with its creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque rendered content
    pub content: String,

    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl CacheEntry {
    /// Create a new entry stamped with `timestamp`
    pub fn new(content: impl Into<String>, timestamp: u64) -> Self {
        Self {
            content: content.into(),
            timestamp,
        }
    }

    /// Age of the entry at `now` in milliseconds
    ///
    /// Clock skew that puts `now` before the timestamp counts as age zero.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    /// Whether the entry has outlived `ttl` at `now`
    ///
    /// An absent TTL never expires.
    pub fn is_expired(&self, now: u64, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => u128::from(self.age_ms(now)) > ttl.as_millis(),
            None => false,
        }
    }

    /// Serialize to the JSON wire shape
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from the JSON wire shape
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let entry = CacheEntry::new("<img src=\"a.webp\">", 1_700_000_000_000);
        let json = entry.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["content"], "<img src=\"a.webp\">");
        assert_eq!(value["timestamp"], 1_700_000_000_000u64);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(CacheEntry::from_json("not json").is_err());
        assert!(CacheEntry::from_json("{\"content\": 3}").is_err());
    }

    #[test]
    fn test_expiry() {
        let entry = CacheEntry::new("x", 1_000);
        let ttl = Some(Duration::from_millis(500));

        assert!(!entry.is_expired(1_500, ttl));
        assert!(entry.is_expired(1_501, ttl));
        assert!(!entry.is_expired(u64::MAX, None));
    }

    #[test]
    fn test_age_with_clock_skew() {
        let entry = CacheEntry::new("x", 2_000);
        assert_eq!(entry.age_ms(1_000), 0);
        assert_eq!(entry.age_ms(2_250), 250);
    }
}
