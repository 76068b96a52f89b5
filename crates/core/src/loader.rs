//! Loader dispatcher
//!
//! Drives one element through Idle -> Loading -> (Loaded | Error):
//!
//! 1. Enter Loading and render the placeholder.
//! 2. Unless forced, serve a cache hit under the original source key.
//! 3. Otherwise classify the resolved URL and run the type handler under the
//!    retry policy.
//! 4. Render the content and cache it, or render the fallback.

use std::sync::Arc;

use ecofull_scheduler::{retry, ElementId, RetryError};
use tracing::{debug, info, warn};

use crate::context::{EngineContext, EngineState};
use crate::element::LoadState;
use crate::env::{Render, ResourceBackend};
use crate::error::{LoadError, LoadResult};
use crate::resolver::resolve;
use crate::resource::{LoadTarget, ResourceKind};

/// A load that needs the backend
pub(crate) struct LoadJob {
    pub id: ElementId,
    /// Cache key, the original source
    pub key: String,
    pub target: LoadTarget,
}

enum Begin {
    /// Already loading, or loaded without force
    Refused,
    /// No source to load
    Missing,
    Cached(String),
    Fetch(LoadJob),
}

/// Start loading `id`
///
/// Returns whether a load sequence began. Backend work is spawned on the
/// current Tokio runtime.
pub(crate) fn load(ctx: &Arc<EngineContext>, id: ElementId, force: bool) -> bool {
    match begin(ctx, id, force) {
        Begin::Refused => false,
        Begin::Missing => {
            ctx.render(id, Render::Placeholder(ctx.config.loading_content.clone()));
            warn!("{}: {}", id, LoadError::MissingSource);
            ctx.render(id, Render::Fallback(ctx.config.error_content.clone()));
            true
        }
        Begin::Cached(content) => {
            ctx.render(id, Render::Placeholder(ctx.config.loading_content.clone()));
            debug!("{}: served from cache", id);
            ctx.render(id, Render::Loaded(content));
            true
        }
        Begin::Fetch(job) => {
            ctx.render(id, Render::Placeholder(ctx.config.loading_content.clone()));
            ctx.spawn(run(Arc::clone(ctx), job));
            true
        }
    }
}

fn begin(ctx: &EngineContext, id: ElementId, force: bool) -> Begin {
    let network = ctx.network.snapshot();
    let viewport_width = ctx.viewport_width();

    let mut state = ctx.state.lock();
    let EngineState { arena, cache, .. } = &mut *state;

    let Some(record) = arena.get_mut(id) else {
        warn!("load requested for unknown element {}", id);
        return Begin::Refused;
    };
    if !record.begin_load(force) {
        debug!("{}: load ignored in state {:?}", id, record.state);
        return Begin::Refused;
    }

    let resolution = resolve(&record.descriptor, &network, viewport_width);
    let (Some(key), Some(resolution)) = (record.descriptor.src.clone(), resolution) else {
        record.finish(LoadState::Error);
        return Begin::Missing;
    };

    record.resolved_key = Some(key.clone());
    record.resolved_url = Some(resolution.url().to_string());

    let cached = match cache {
        Some(cache) if !force => cache.get(&key),
        _ => None,
    };
    if let Some(content) = cached {
        record.finish(LoadState::Loaded);
        return Begin::Cached(content);
    }

    let url = resolution.url().to_string();
    let kind = record
        .descriptor
        .kind_hint
        .unwrap_or_else(|| ResourceKind::classify(&url));
    let target = LoadTarget::new(kind, url, &record.descriptor, resolution.srcset());
    debug!("{}: loading {} as {:?}", id, target.url(), target.kind());

    Begin::Fetch(LoadJob { id, key, target })
}

/// Run the type handler for `job` and settle the element
pub(crate) async fn run(ctx: Arc<EngineContext>, job: LoadJob) {
    let LoadJob { id, key, target } = job;
    let policy = ctx.config.retry_policy();
    let backend = Arc::clone(&ctx.env.backend);

    let result = retry(&policy, LoadError::is_transient, |retries| {
        if let Some(record) = ctx.state.lock().arena.get_mut(id) {
            record.retry_count = retries;
        }
        let backend = Arc::clone(&backend);
        let target = target.clone();
        async move { fetch(backend.as_ref(), &target).await }
    })
    .await;

    match result {
        Ok((content, attempts)) => {
            {
                let mut state = ctx.state.lock();
                let EngineState { arena, cache, .. } = &mut *state;
                let finished = arena
                    .get_mut(id)
                    .is_some_and(|record| record.finish(LoadState::Loaded));
                if let (true, Some(cache)) = (finished, cache.as_mut()) {
                    cache.set(&key, content.clone());
                }
            }
            info!("{}: loaded {} after {} attempt(s)", id, target.url(), attempts);
            ctx.render(id, Render::Loaded(content));
        }
        Err(RetryError { error, attempts }) => {
            if let Some(record) = ctx.state.lock().arena.get_mut(id) {
                record.finish(LoadState::Error);
            }
            warn!("{}: failed after {} attempt(s): {}", id, attempts, error);
            ctx.render(id, Render::Fallback(ctx.config.error_content.clone()));
        }
    }
}

/// Run the handler for `target` once
async fn fetch(backend: &dyn ResourceBackend, target: &LoadTarget) -> LoadResult<String> {
    match target {
        LoadTarget::Image { url, .. } => backend.decode_image(url).await?,
        LoadTarget::Video { url, .. } => backend.load_video(url).await?,
        LoadTarget::Frame { url, .. } => backend.load_frame(url).await?,
        LoadTarget::Fetch { url } => return backend.fetch_text(url).await,
    }
    Ok(target.markup().unwrap_or_default())
}
