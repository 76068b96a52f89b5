//! Observation priority
//!
//! In `auto` mode elements are split at registration time: those already
//! intersecting the viewport are observed immediately, the rest after
//! [`DEFERRED_OBSERVE_DELAY`]. Above-the-fold content wins the race without
//! starving the rest of the page. `manual` mode observes everything at once,
//! in document order.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::monitor::ElementId;

/// Delay before below-the-fold elements join observation
pub const DEFERRED_OBSERVE_DELAY: Duration = Duration::from_millis(100);

/// How observation order is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMode {
    /// Split by an immediate geometry check
    #[default]
    Auto,
    /// Observe all elements immediately in document order
    Manual,
}

/// Result of splitting elements into priority groups
///
/// Both groups keep document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationPlan {
    /// Observed right away
    pub immediate: Vec<ElementId>,

    /// Observed after [`DEFERRED_OBSERVE_DELAY`]
    pub deferred: Vec<ElementId>,
}

impl ObservationPlan {
    /// Split `ids` according to `mode`
    ///
    /// `is_intersecting` is only consulted in `Auto` mode.
    pub fn build<I, F>(mode: PriorityMode, ids: I, mut is_intersecting: F) -> Self
    where
        I: IntoIterator<Item = ElementId>,
        F: FnMut(ElementId) -> bool,
    {
        let mut plan = Self::default();

        for id in ids {
            let immediate = match mode {
                PriorityMode::Manual => true,
                PriorityMode::Auto => is_intersecting(id),
            };

            if immediate {
                plan.immediate.push(id);
            } else {
                plan.deferred.push(id);
            }
        }

        plan
    }

    /// Total number of planned elements
    pub fn len(&self) -> usize {
        self.immediate.len() + self.deferred.len()
    }

    /// Check if the plan is empty
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.deferred.is_empty()
    }
}
