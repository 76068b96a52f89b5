//! EcoFull Core Library
//!
//! Lazy loading of images, video, embedded frames and generic content. The
//! engine watches elements for visibility, resolves the best source for the
//! current viewport and network, loads it with retries, caches what it
//! rendered and warms connections for what comes next.

pub mod config;
mod context;
pub mod element;
pub mod engine;
pub mod env;
pub mod error;
pub mod lifecycle;
mod loader;
pub mod network;
pub mod preload;
pub mod resolver;
pub mod resource;

pub use config::{EngineConfig, DEFAULT_ERROR_CONTENT, DEFAULT_LOADING_CONTENT};
pub use element::{
    AttributeMap, ElementArena, ElementDescriptor, ElementRecord, FrameOptions, LoadState,
    VideoOptions,
};
pub use engine::Engine;
pub use env::{Environment, HintSink, NoHints, Render, RenderSink, ResourceBackend};
pub use error::{ConfigError, LoadError, LoadResult, ResolveError};
pub use lifecycle::{LifecycleEvent, PageVisibility, UnknownEvent};
pub use network::{ConnectionType, EffectiveType, NetworkChange, NetworkDetector, NetworkState};
pub use preload::{origin_of, PreloadAssistant};
pub use resolver::{optimized_name, resolve, Breakpoints, Resolution};
pub use resource::{HintType, LoadTarget, ResourceKind};

// Scheduler and cache types that appear in this crate's API
pub use ecofull_cache::{CacheBackend, CacheStats, SessionStorage};
pub use ecofull_scheduler::{ElementId, Geometry, PriorityMode, Rect, RootMargin};
