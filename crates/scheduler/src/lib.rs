//! EcoFull Scheduler Library
//!
//! Decides *when* resources load: viewport geometry with root margins,
//! one-shot visibility triggering, priority ordering of observation, and the
//! retry-with-backoff combinator used by the loader.
//!
//! # Example
//!
//! ```
//! use ecofull_scheduler::{ElementId, ObservationPlan, PriorityMode, RootMargin, VisibilityMonitor};
//!
//! let mut monitor = VisibilityMonitor::new(0.1, RootMargin::default());
//!
//! // Element 0 is above the fold, element 1 is not
//! let plan = ObservationPlan::build(PriorityMode::Auto, [ElementId(0), ElementId(1)], |id| {
//!     id == ElementId(0)
//! });
//! monitor.observe_all(plan.immediate.iter().copied());
//!
//! // ... after DEFERRED_OBSERVE_DELAY
//! monitor.observe_all(plan.deferred.iter().copied());
//!
//! if monitor.on_intersection(ElementId(1), 0.25) {
//!     // start loading element 1
//! }
//! ```

mod monitor;
mod priority;
mod retry;
mod viewport;

// Re-export public API
pub use monitor::{meets_threshold, ElementId, VisibilityMonitor};
pub use priority::{ObservationPlan, PriorityMode, DEFERRED_OBSERVE_DELAY};
pub use retry::{retry, RetryError, RetryPolicy};
pub use viewport::{intersection_ratio, Geometry, MarginLength, MarginParseError, Rect, RootMargin};
