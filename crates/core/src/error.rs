//! Error types for loading and resolution
//!
//! Only [`LoadError::Transport`] is transient. Resolution and cache errors
//! are absorbed where they happen and never surface as an element failure.

/// Why a load attempt failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The element declares no usable source
    #[error("element declares no source")]
    MissingSource,

    /// Fetch, decode or frame load failed
    #[error("failed to load {url}: {reason}")]
    Transport { url: String, reason: String },
}

impl LoadError {
    /// Create a transport failure
    pub fn transport(url: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::Transport {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether a retry could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LoadError::Transport { .. })
    }
}

/// Malformed responsive data on an element
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("breakpoint map is not a JSON object: {0}")]
    BreakpointSyntax(String),

    #[error("breakpoint width {0:?} is not a non-negative integer")]
    BreakpointWidth(String),
}

/// Invalid engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("threshold must be within 0.0..=1.0, got {0}")]
    Threshold(f64),

    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for load operations
pub type LoadResult<T> = Result<T, LoadError>;
