//! Per-engine shared state

use std::future::Future;

use ecofull_cache::CacheStore;
use ecofull_scheduler::{ElementId, VisibilityMonitor};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::EngineConfig;
use crate::element::ElementArena;
use crate::env::{Environment, Render};
use crate::lifecycle::PageVisibility;
use crate::network::NetworkDetector;
use crate::preload::PreloadAssistant;

/// Mutable engine state, guarded by one lock
///
/// The lock is never held across an `.await` or a render call.
pub(crate) struct EngineState {
    pub arena: ElementArena,
    pub monitor: VisibilityMonitor,
    /// `None` when caching is disabled
    pub cache: Option<CacheStore>,
    pub preload: PreloadAssistant,
    pub page: PageVisibility,
    pub tasks: Vec<JoinHandle<()>>,
}

/// Everything one engine owns
pub(crate) struct EngineContext {
    pub config: EngineConfig,
    pub env: Environment,
    pub network: NetworkDetector,
    pub state: Mutex<EngineState>,
}

impl EngineContext {
    pub fn new(config: EngineConfig, env: Environment, arena: ElementArena) -> Self {
        let monitor = VisibilityMonitor::new(config.threshold, config.root_margin);
        let cache = open_cache(&config, &env);
        let network = NetworkDetector::new(env.supports_optimized_format);

        Self {
            state: Mutex::new(EngineState {
                arena,
                monitor,
                cache,
                preload: PreloadAssistant::new(),
                page: PageVisibility::default(),
                tasks: Vec::new(),
            }),
            config,
            env,
            network,
        }
    }

    pub fn render(&self, id: ElementId, render: Render) {
        self.env.sink.render(id, render);
    }

    pub fn viewport_width(&self) -> f64 {
        self.env.geometry.viewport().width
    }

    /// Spawn a task and keep its handle for `settle`
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut state = self.state.lock();
        state.tasks.retain(|h| !h.is_finished());
        state.tasks.push(handle);
    }
}

fn open_cache(config: &EngineConfig, env: &Environment) -> Option<CacheStore> {
    if !config.cache_enabled {
        return None;
    }

    let cache_config = config.cache_config();
    let opened = match (&env.session, cache_config.backend) {
        (Some(session), ecofull_cache::CacheBackend::Session) => {
            Ok(CacheStore::with_storage(Box::new(session.clone())).with_ttl(cache_config.ttl))
        }
        _ => CacheStore::open(&cache_config),
    };

    let store = opened.unwrap_or_else(|e| {
        warn!("cache backend unavailable, using memory: {}", e);
        CacheStore::memory().with_ttl(cache_config.ttl)
    });

    Some(match &env.clock {
        Some(clock) => store.with_clock(clock.clone()),
        None => store,
    })
}
