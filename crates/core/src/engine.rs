//! Engine facade
//!
//! An [`Engine`] owns the element arena, the visibility monitor, the cache
//! and the network detector for one set of elements. The host feeds it
//! visibility, network and lifecycle events; the engine answers through the
//! [`Environment`] it was built with.

use std::sync::Arc;

use ecofull_cache::CacheStats;
use ecofull_scheduler::{ElementId, ObservationPlan, DEFERRED_OBSERVE_DELAY};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::element::{ElementArena, ElementDescriptor, ElementRecord, LoadState};
use crate::env::Environment;
use crate::error::ConfigError;
use crate::lifecycle::{responsive_reload_targets, LifecycleEvent};
use crate::loader;
use crate::network::{NetworkChange, NetworkState};
use crate::resource::ResourceKind;

/// Lazy-loading engine for one page
///
/// Cheap to clone; clones share the same state. Every method that may start
/// a load must be called from within a Tokio runtime.
///
/// # Example
///
/// ```no_run
/// # use ecofull_core::*;
/// # async fn demo(env: Environment) -> Result<(), ConfigError> {
/// let elements = vec![
///     ElementDescriptor::with_src("https://cdn.example.com/hero.jpg"),
///     ElementDescriptor::with_src("partials/footer.html"),
/// ];
/// let engine = Engine::init(EngineConfig::default(), env, elements)?;
///
/// // the host reports scrolling
/// engine.sweep();
/// engine.settle().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    ctx: Arc<EngineContext>,
}

impl Engine {
    /// Register `elements` and start observing them
    ///
    /// In auto priority mode, elements already intersecting are observed
    /// immediately and the rest after [`DEFERRED_OBSERVE_DELAY`]. Origins of
    /// absolute sources are preconnected once.
    pub fn init<I>(config: EngineConfig, env: Environment, elements: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = ElementDescriptor>,
    {
        config.validate()?;

        let mut arena = ElementArena::new();
        for descriptor in elements {
            arena.insert(descriptor);
        }

        let engine = Self {
            ctx: Arc::new(EngineContext::new(config, env, arena)),
        };
        info!("tracking {} element(s)", engine.len());

        if engine.ctx.config.preconnect {
            engine.preconnect();
        }

        let plan = {
            let state = engine.ctx.state.lock();
            let geometry = engine.ctx.env.geometry.as_ref();
            ObservationPlan::build(engine.ctx.config.priority_mode, state.arena.ids(), |id| {
                state.monitor.is_intersecting(id, geometry)
            })
        };
        debug!(
            "observing {} of {} element(s) now",
            plan.immediate.len(),
            plan.len()
        );

        engine.ctx.state.lock().monitor.observe_all(plan.immediate);
        engine.sweep();

        if !plan.deferred.is_empty() {
            let deferred = engine.clone();
            let ids = plan.deferred;
            engine.ctx.spawn(async move {
                tokio::time::sleep(DEFERRED_OBSERVE_DELAY).await;
                deferred.ctx.state.lock().monitor.observe_all(ids);
                deferred.sweep();
            });
        }

        Ok(engine)
    }

    /// Host-reported intersection ratio for `id`
    ///
    /// Returns whether this event triggered the element.
    pub fn on_intersection(&self, id: ElementId, ratio: f64) -> bool {
        let fired = self.ctx.state.lock().monitor.on_intersection(id, ratio);
        if fired {
            self.trigger(id);
        }
        fired
    }

    /// Check every observed element against the current geometry
    ///
    /// Does nothing while the page is hidden. Returns the triggered elements.
    pub fn sweep(&self) -> Vec<ElementId> {
        let fired = {
            let mut state = self.ctx.state.lock();
            if state.page.is_hidden() {
                debug!("page hidden, sweep skipped");
                return Vec::new();
            }
            state.monitor.sweep(self.ctx.env.geometry.as_ref())
        };

        for &id in &fired {
            self.trigger(id);
        }
        fired
    }

    /// Reload `id`, bypassing the cache read
    ///
    /// Returns false if the element is unknown or already loading.
    pub fn force_reload(&self, id: ElementId) -> bool {
        self.ctx.state.lock().monitor.unobserve(id);
        loader::load(&self.ctx, id, true)
    }

    /// Remove every cached entry; returns how many were removed
    pub fn clear_cache(&self) -> usize {
        let mut state = self.ctx.state.lock();
        match state.cache.as_mut() {
            Some(cache) => {
                let removed = cache.clear();
                info!("cleared {} cache entries", removed);
                removed
            }
            None => 0,
        }
    }

    /// Apply a network change event
    pub fn on_network_change(&self, change: NetworkChange) {
        self.ctx.network.update(change);
    }

    /// Apply a page lifecycle event
    pub fn on_lifecycle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::ViewportChanged => {
                let targets = responsive_reload_targets(&self.ctx.state.lock().arena);
                debug!("viewport changed, reloading {} element(s)", targets.len());
                for id in targets {
                    loader::load(&self.ctx, id, true);
                }
            }
            LifecycleEvent::PageHidden | LifecycleEvent::PageVisible => {
                let now_visible = self.ctx.state.lock().page.apply(event);
                if now_visible {
                    debug!("page visible, rechecking observed elements");
                    self.sweep();
                }
            }
        }
    }

    /// Wait for every spawned load and timer to finish
    pub async fn settle(&self) {
        loop {
            let tasks = std::mem::take(&mut self.ctx.state.lock().tasks);
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                let _ = task.await;
            }
        }
    }

    /// Load state of `id`
    pub fn state(&self, id: ElementId) -> Option<LoadState> {
        self.ctx.state.lock().arena.get(id).map(|r| r.state)
    }

    /// Snapshot of the record for `id`
    pub fn record(&self, id: ElementId) -> Option<ElementRecord> {
        self.ctx.state.lock().arena.get(id).cloned()
    }

    /// Whether `id` is still waiting for visibility
    pub fn is_observed(&self, id: ElementId) -> bool {
        self.ctx.state.lock().monitor.is_observed(id)
    }

    /// Number of tracked elements
    pub fn len(&self) -> usize {
        self.ctx.state.lock().arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current network snapshot
    pub fn network(&self) -> NetworkState {
        self.ctx.network.snapshot()
    }

    /// Cache counters, `None` when caching is disabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.ctx.state.lock().cache.as_ref().map(|c| c.stats())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    fn trigger(&self, id: ElementId) {
        debug!("{} became visible", id);
        loader::load(&self.ctx, id, false);
        if self.ctx.config.preload_next {
            self.prefetch_after(id);
        }
    }

    fn preconnect(&self) {
        let origins = {
            let mut state = self.ctx.state.lock();
            let state = &mut *state;
            state
                .preload
                .claim_origins(state.arena.iter().map(|r| &r.descriptor))
        };
        for origin in origins {
            debug!("preconnect {}", origin);
            self.ctx.env.hints.preconnect(&origin);
        }
    }

    /// Prefetch the declared source of the next pending element
    fn prefetch_after(&self, id: ElementId) {
        let next = self.ctx.state.lock().arena.next_pending_after(id).and_then(|r| {
            let src = r.descriptor.src.clone()?;
            Some((src, r.descriptor.kind_hint))
        });
        let Some((url, kind_hint)) = next else {
            return;
        };

        let hint = kind_hint
            .unwrap_or_else(|| ResourceKind::classify(&url))
            .hint_type();

        if self.ctx.state.lock().preload.claim_prefetch(&url) {
            debug!("prefetch {} as {}", url, hint.as_str());
            self.ctx.env.hints.prefetch(&url, hint);
        }
    }
}
