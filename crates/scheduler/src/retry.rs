//! Retry with linear backoff
//!
//! A failed attempt is retried after `base_delay * n`, where `n` counts the
//! retries made so far including this one. With `max_retries = N` an
//! operation that never succeeds is attempted `N + 1` times and waits
//! `base_delay * (1 + 2 + ... + N)` in total. Waiting is an awaited timer,
//! so retries never grow the stack.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Retry settings for one load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether failures are retried at all
    pub enabled: bool,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay unit for the linear backoff
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Policy that makes a single attempt
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set whether retries are enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the retry bound
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff unit
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Total attempts for an operation that keeps failing
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }

    /// Sum of all backoff delays for an operation that keeps failing
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts()).map(|retry| self.delay_for(retry)).sum()
    }
}

/// Operation failed on its last permitted attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("gave up after {attempts} attempt(s): {error}")]
pub struct RetryError<E> {
    /// Error from the final attempt
    pub error: E,

    /// Attempts made, including the first
    pub attempts: u32,
}

/// Run `op` under `policy`
///
/// `op` receives the retry counter (0 for the first attempt). Errors for
/// which `is_transient` returns `false` are not retried. On success returns
/// the value together with the number of attempts made.
pub async fn retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut is_transient: P,
    mut op: F,
) -> Result<(T, u32), RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let mut retries = 0u32;

    loop {
        match op(retries).await {
            Ok(value) => return Ok((value, retries + 1)),
            Err(error) => {
                let attempts = retries + 1;
                if attempts >= max_attempts || !is_transient(&error) {
                    debug!("giving up after {} attempt(s): {}", attempts, error);
                    return Err(RetryError { error, attempts });
                }

                retries += 1;
                let delay = policy.delay_for(retries);
                warn!(
                    "attempt {} failed, retrying in {:?}: {}",
                    attempts, delay, error
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
