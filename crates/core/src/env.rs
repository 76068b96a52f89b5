//! Host environment
//!
//! Everything the engine needs from its host sits behind the traits here:
//! where markup goes, how resources are fetched, where connection hints go
//! and what the page geometry looks like. An [`Environment`] bundles one
//! implementation of each.

use std::sync::Arc;

use async_trait::async_trait;
use ecofull_cache::{Clock, SessionStorage};
use ecofull_scheduler::{ElementId, Geometry};

use crate::error::LoadResult;
use crate::resource::HintType;

/// Content handed to the render sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Render {
    /// Loading placeholder
    Placeholder(String),
    /// Final content
    Loaded(String),
    /// Error fallback
    Fallback(String),
}

/// Receives rendered content for elements
pub trait RenderSink: Send + Sync {
    fn render(&self, id: ElementId, render: Render);
}

/// Performs the actual resource loads
///
/// Media loads only report success; the engine renders their markup itself.
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    async fn decode_image(&self, url: &str) -> LoadResult<()>;

    async fn load_video(&self, url: &str) -> LoadResult<()>;

    async fn load_frame(&self, url: &str) -> LoadResult<()>;

    /// Fetch a generic resource as text
    async fn fetch_text(&self, url: &str) -> LoadResult<String>;
}

/// Receives advisory connection hints
pub trait HintSink: Send + Sync {
    fn preconnect(&self, _origin: &str) {}

    fn prefetch(&self, _url: &str, _hint: HintType) {}
}

/// Hint sink that drops every hint
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHints;

impl HintSink for NoHints {}

/// Host services for one engine
#[derive(Clone)]
pub struct Environment {
    pub sink: Arc<dyn RenderSink>,
    pub backend: Arc<dyn ResourceBackend>,
    pub geometry: Arc<dyn Geometry>,
    pub hints: Arc<dyn HintSink>,

    /// Result of the optimized-format check, `None` when unavailable
    pub supports_optimized_format: Option<bool>,

    /// Session storage area shared with other engines of the same session
    pub session: Option<SessionStorage>,

    /// Clock for cache timestamps
    pub clock: Option<Arc<dyn Clock>>,
}

impl Environment {
    /// Create an environment without hints or format support
    pub fn new(
        sink: Arc<dyn RenderSink>,
        backend: Arc<dyn ResourceBackend>,
        geometry: Arc<dyn Geometry>,
    ) -> Self {
        Self {
            sink,
            backend,
            geometry,
            hints: Arc::new(NoHints),
            supports_optimized_format: None,
            session: None,
            clock: None,
        }
    }

    pub fn with_hints(mut self, hints: Arc<dyn HintSink>) -> Self {
        self.hints = hints;
        self
    }

    /// Record the optimized-format check result
    pub fn with_format_support(mut self, supported: Option<bool>) -> Self {
        self.supports_optimized_format = supported;
        self
    }

    pub fn with_session(mut self, session: SessionStorage) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}
