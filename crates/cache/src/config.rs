//! Cache configuration
//!
//! Selects the backend, the entry TTL and the directory used by the
//! persistent backend. Configuration can be built programmatically or read
//! from environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where cache entries are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// JSON document on disk, survives restarts
    #[default]
    Persistent,
    /// Shared in-process storage area for one session
    Session,
    /// Typed entries private to one store
    Memory,
}

impl FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "persistent" | "local" | "localstorage" => Ok(Self::Persistent),
            "session" | "sessionstorage" => Ok(Self::Session),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue(format!("cache backend {other:?}"))),
        }
    }
}

/// Configuration for the cache store.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Whether the cache is consulted and written at all
    pub enabled: bool,
    /// Backend selector
    pub backend: CacheBackend,
    /// Entry lifetime; `None` never expires
    pub ttl: Option<Duration>,
    /// Directory for the persistent backend
    pub storage_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Persistent,
            ttl: None,
            storage_dir: Self::default_storage_dir(),
        }
    }
}

impl CacheConfig {
    /// Sets whether caching is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the backend.
    pub fn with_backend(mut self, backend: CacheBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the entry TTL.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the persistent storage directory.
    pub fn with_storage_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.storage_dir = path.as_ref().to_path_buf();
        self
    }

    /// Returns the default storage directory for the current platform.
    ///
    /// - macOS: ~/Library/Caches/ecofull
    /// - Linux: ~/.cache/ecofull
    /// - Windows: %LOCALAPPDATA%\ecofull
    pub fn default_storage_dir() -> PathBuf {
        if let Some(cache_dir) = dirs::cache_dir() {
            cache_dir.join("ecofull")
        } else {
            PathBuf::from("cache/ecofull")
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ECOFULL_CACHE_ENABLED`: `true` or `false` (default: true)
    /// - `ECOFULL_CACHE_BACKEND`: `persistent`, `session` or `memory`
    /// - `ECOFULL_CACHE_TTL_MS`: entry lifetime in milliseconds, `0` for none
    /// - `ECOFULL_CACHE_DIR`: persistent storage directory
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ECOFULL_CACHE_ENABLED") {
            config.enabled = val
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue("ECOFULL_CACHE_ENABLED".to_string()))?;
        }

        if let Ok(val) = std::env::var("ECOFULL_CACHE_BACKEND") {
            config.backend = val.parse()?;
        }

        if let Ok(val) = std::env::var("ECOFULL_CACHE_TTL_MS") {
            let ms = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue("ECOFULL_CACHE_TTL_MS".to_string()))?;
            config.ttl = (ms > 0).then(|| Duration::from_millis(ms));
        }

        if let Ok(val) = std::env::var("ECOFULL_CACHE_DIR") {
            config.storage_dir = PathBuf::from(val);
        }

        Ok(config)
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ENV_VARS: [&str; 4] = [
        "ECOFULL_CACHE_ENABLED",
        "ECOFULL_CACHE_BACKEND",
        "ECOFULL_CACHE_TTL_MS",
        "ECOFULL_CACHE_DIR",
    ];

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackend::Persistent);
        assert_eq!(config.ttl, None);
        assert!(config.storage_dir.ends_with("ecofull"));
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::default()
            .with_enabled(false)
            .with_backend(CacheBackend::Memory)
            .with_ttl(Some(Duration::from_secs(60)))
            .with_storage_dir("/custom/path");

        assert!(!config.enabled);
        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.storage_dir, PathBuf::from("/custom/path"));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("persistent".parse::<CacheBackend>().unwrap(), CacheBackend::Persistent);
        assert_eq!("localStorage".parse::<CacheBackend>().unwrap(), CacheBackend::Persistent);
        assert_eq!(" Session ".parse::<CacheBackend>().unwrap(), CacheBackend::Session);
        assert_eq!("memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert!("redis".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn test_backend_serde_names() {
        let backend: CacheBackend = serde_json::from_str("\"session\"").unwrap();
        assert_eq!(backend, CacheBackend::Session);
        assert_eq!(serde_json::to_string(&CacheBackend::Memory).unwrap(), "\"memory\"");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&ENV_VARS);

        env::set_var("ECOFULL_CACHE_ENABLED", "false");
        env::set_var("ECOFULL_CACHE_BACKEND", "session");
        env::set_var("ECOFULL_CACHE_TTL_MS", "30000");
        env::set_var("ECOFULL_CACHE_DIR", "/tmp/ecofull-test");

        let config = CacheConfig::from_env().unwrap();
        assert!(!config.enabled);
        assert_eq!(config.backend, CacheBackend::Session);
        assert_eq!(config.ttl, Some(Duration::from_millis(30_000)));
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/ecofull-test"));
    }

    #[test]
    #[serial]
    fn test_from_env_zero_ttl_means_none() {
        let _guard = EnvGuard::new(&ENV_VARS);
        for name in ENV_VARS {
            env::remove_var(name);
        }
        env::set_var("ECOFULL_CACHE_TTL_MS", "0");

        let config = CacheConfig::from_env().unwrap();
        assert_eq!(config.ttl, None);
        assert_eq!(config.backend, CacheBackend::Persistent); // default
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        let _guard = EnvGuard::new(&ENV_VARS);

        env::set_var("ECOFULL_CACHE_TTL_MS", "soon");
        assert!(CacheConfig::from_env().is_err());

        env::set_var("ECOFULL_CACHE_TTL_MS", "10");
        env::set_var("ECOFULL_CACHE_BACKEND", "cloud");
        assert!(CacheConfig::from_env().is_err());
    }

    // Helper to save and restore environment variables
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }
}
