//! Engine configuration
//!
//! One `EngineConfig` is fixed for the lifetime of an [`Engine`](crate::Engine).
//! It can be built with the `with_*` methods or parsed from JSON using the
//! camelCase option names (`threshold`, `rootMargin`, `cacheEnabled`, ...).

use std::path::PathBuf;
use std::time::Duration;

use ecofull_cache::{CacheBackend, CacheConfig};
use ecofull_scheduler::{PriorityMode, RetryPolicy, RootMargin};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Default loading placeholder markup
pub const DEFAULT_LOADING_CONTENT: &str = "<div class=\"ecofull-loading\"></div>";

/// Default error fallback markup
pub const DEFAULT_ERROR_CONTENT: &str =
    "<div class=\"ecofull-error\">Content could not be loaded</div>";

/// Configuration for lazy loading
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Fraction of an element that must be visible (0.0 to 1.0)
    pub threshold: f64,

    /// Expansion of the viewport test region
    pub root_margin: RootMargin,

    /// Whether rendered payloads are cached
    pub cache_enabled: bool,

    /// Cache backend selector
    pub cache_backend: CacheBackend,

    /// Cache entry lifetime in milliseconds; absent never expires
    #[serde(deserialize_with = "optional_millis")]
    pub cache_ttl: Option<Duration>,

    /// Directory for the persistent cache backend
    pub cache_dir: Option<PathBuf>,

    /// Whether failed loads are retried
    pub retry_enabled: bool,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff unit in milliseconds
    #[serde(deserialize_with = "millis")]
    pub retry_delay: Duration,

    /// Markup shown while an element loads
    pub loading_content: String,

    /// Markup shown when an element fails for good
    pub error_content: String,

    /// Prefetch the next pending element after each trigger
    pub preload_next: bool,

    /// Warm connections to every origin at init
    pub preconnect: bool,

    /// How observation order is decided
    pub priority_mode: PriorityMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin::px(100.0),
            cache_enabled: true,
            cache_backend: CacheBackend::Persistent,
            cache_ttl: None,
            cache_dir: None,
            retry_enabled: true,
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            loading_content: DEFAULT_LOADING_CONTENT.to_string(),
            error_content: DEFAULT_ERROR_CONTENT.to_string(),
            preload_next: true,
            preconnect: true,
            priority_mode: PriorityMode::Auto,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration object
    ///
    /// Missing keys keep their defaults; unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        Ok(())
    }

    /// Set the visibility threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the root margin
    pub fn with_root_margin(mut self, margin: RootMargin) -> Self {
        self.root_margin = margin;
        self
    }

    /// Enable or disable caching
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Set the cache backend
    pub fn with_cache_backend(mut self, backend: CacheBackend) -> Self {
        self.cache_backend = backend;
        self
    }

    /// Set the cache TTL
    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the persistent cache directory
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Enable or disable retries
    pub fn with_retry(mut self, enabled: bool) -> Self {
        self.retry_enabled = enabled;
        self
    }

    /// Set the retry bound
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff unit
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the loading placeholder markup
    pub fn with_loading_content(mut self, content: impl Into<String>) -> Self {
        self.loading_content = content.into();
        self
    }

    /// Set the error fallback markup
    pub fn with_error_content(mut self, content: impl Into<String>) -> Self {
        self.error_content = content.into();
        self
    }

    /// Enable or disable next-element prefetch
    pub fn with_preload_next(mut self, enabled: bool) -> Self {
        self.preload_next = enabled;
        self
    }

    /// Enable or disable origin preconnect
    pub fn with_preconnect(mut self, enabled: bool) -> Self {
        self.preconnect = enabled;
        self
    }

    /// Set the priority mode
    pub fn with_priority_mode(mut self, mode: PriorityMode) -> Self {
        self.priority_mode = mode;
        self
    }

    /// Retry policy derived from the retry options
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            enabled: self.retry_enabled,
            max_retries: self.max_retries,
            base_delay: self.retry_delay,
        }
    }

    /// Cache configuration derived from the cache options
    pub fn cache_config(&self) -> CacheConfig {
        let config = CacheConfig::default()
            .with_enabled(self.cache_enabled)
            .with_backend(self.cache_backend)
            .with_ttl(self.cache_ttl);

        match &self.cache_dir {
            Some(dir) => config.with_storage_dir(dir),
            None => config,
        }
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn optional_millis<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}
