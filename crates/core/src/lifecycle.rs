//! Page lifecycle events
//!
//! Orientation and viewport size changes force responsive elements to
//! re-resolve. Visibility changes gate geometry sweeps: while the page is
//! hidden nothing is re-checked, and becoming visible re-checks everything
//! still under observation.

use std::str::FromStr;

use ecofull_scheduler::ElementId;

use crate::element::{ElementArena, LoadState};

/// Lifecycle event reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Orientation or viewport size changed
    ViewportChanged,
    PageHidden,
    PageVisible,
}

/// Unknown event name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifecycle event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for LifecycleEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orientationchange" | "resize" | "viewport" => Ok(LifecycleEvent::ViewportChanged),
            "hidden" | "pagehide" => Ok(LifecycleEvent::PageHidden),
            "visible" | "pageshow" => Ok(LifecycleEvent::PageVisible),
            _ => Err(UnknownEvent(s.to_string())),
        }
    }
}

/// Loaded elements that must re-resolve after a viewport change
pub fn responsive_reload_targets(arena: &ElementArena) -> Vec<ElementId> {
    arena
        .iter()
        .filter(|r| r.state == LoadState::Loaded && r.descriptor.is_responsive())
        .map(|r| r.id)
        .collect()
}

/// Page visibility as last reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageVisibility {
    hidden: bool,
}

impl PageVisibility {
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Record `event`; returns true when the page just became visible again
    pub fn apply(&mut self, event: LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::PageHidden => {
                self.hidden = true;
                false
            }
            LifecycleEvent::PageVisible => {
                let was_hidden = self.hidden;
                self.hidden = false;
                was_hidden
            }
            LifecycleEvent::ViewportChanged => false,
        }
    }
}
