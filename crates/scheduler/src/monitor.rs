//! One-shot visibility monitor
//!
//! Tracks the set of observed elements and fires at most once per element:
//! the first time its intersection ratio meets the threshold, the element is
//! removed from observation for good.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::debug;

use crate::viewport::{intersection_ratio, Geometry, RootMargin};

/// Index of a trackable element, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a ratio counts as visible for `threshold`
///
/// A ratio of zero never counts, so a zero threshold means "any overlap".
pub fn meets_threshold(ratio: f64, threshold: f64) -> bool {
    ratio > 0.0 && ratio >= threshold
}

/// Visibility monitor with one-shot triggering
///
/// # Example
///
/// ```
/// use ecofull_scheduler::{ElementId, RootMargin, VisibilityMonitor};
///
/// let mut monitor = VisibilityMonitor::new(0.1, RootMargin::default());
/// monitor.observe(ElementId(0));
///
/// assert!(!monitor.on_intersection(ElementId(0), 0.05));
/// assert!(monitor.on_intersection(ElementId(0), 0.5));
///
/// // Already fired; never again
/// assert!(!monitor.on_intersection(ElementId(0), 1.0));
/// ```
#[derive(Debug)]
pub struct VisibilityMonitor {
    threshold: f64,
    margin: RootMargin,
    observed: BTreeSet<ElementId>,
    triggered: HashSet<ElementId>,
}

impl VisibilityMonitor {
    /// Create a monitor with a threshold (clamped to 0.0..=1.0) and margin
    pub fn new(threshold: f64, margin: RootMargin) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            margin,
            observed: BTreeSet::new(),
            triggered: HashSet::new(),
        }
    }

    /// Visible ratio required to fire
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Viewport expansion applied in geometry sweeps
    pub fn margin(&self) -> &RootMargin {
        &self.margin
    }

    /// Start observing an element
    ///
    /// Returns `false` if it is already observed or has already fired.
    pub fn observe(&mut self, id: ElementId) -> bool {
        if self.triggered.contains(&id) {
            return false;
        }
        self.observed.insert(id)
    }

    /// Start observing several elements, returning how many were added
    pub fn observe_all<I: IntoIterator<Item = ElementId>>(&mut self, ids: I) -> usize {
        ids.into_iter().filter(|id| self.observe(*id)).count()
    }

    /// Stop observing an element without firing
    pub fn unobserve(&mut self, id: ElementId) -> bool {
        self.observed.remove(&id)
    }

    /// Check if an element is currently observed
    pub fn is_observed(&self, id: ElementId) -> bool {
        self.observed.contains(&id)
    }

    /// Check if an element has already fired
    pub fn has_fired(&self, id: ElementId) -> bool {
        self.triggered.contains(&id)
    }

    /// Observed elements in document order
    pub fn observed(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.observed.iter().copied()
    }

    /// Number of observed elements
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    /// Check if nothing is observed
    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Report a ratio for an element
    ///
    /// Returns `true` exactly once per element: when it is observed and the
    /// ratio meets the threshold. The element is then unobserved.
    pub fn on_intersection(&mut self, id: ElementId, ratio: f64) -> bool {
        if !self.observed.contains(&id) || !meets_threshold(ratio, self.threshold) {
            return false;
        }

        self.observed.remove(&id);
        self.triggered.insert(id);
        debug!("element {} became visible (ratio {:.2})", id, ratio);
        true
    }

    /// Compute ratios for all observed elements and fire the visible ones
    ///
    /// Returns the elements that fired, in document order. Elements without
    /// bounds are skipped.
    pub fn sweep(&mut self, geometry: &dyn Geometry) -> Vec<ElementId> {
        let viewport = geometry.viewport();
        let candidates: Vec<ElementId> = self.observed.iter().copied().collect();

        let mut fired = Vec::new();
        for id in candidates {
            let Some(bounds) = geometry.bounds(id) else {
                continue;
            };
            let ratio = intersection_ratio(bounds, viewport, &self.margin);
            if self.on_intersection(id, ratio) {
                fired.push(id);
            }
        }
        fired
    }

    /// Immediate intersection check, used for the priority split
    pub fn is_intersecting(&self, id: ElementId, geometry: &dyn Geometry) -> bool {
        geometry
            .bounds(id)
            .map(|bounds| intersection_ratio(bounds, geometry.viewport(), &self.margin) > 0.0)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::Rect;
    use std::collections::HashMap;

    struct FixedGeometry {
        viewport: Rect,
        bounds: HashMap<ElementId, Rect>,
    }

    impl Geometry for FixedGeometry {
        fn viewport(&self) -> Rect {
            self.viewport
        }

        fn bounds(&self, id: ElementId) -> Option<Rect> {
            self.bounds.get(&id).copied()
        }
    }

    fn page() -> FixedGeometry {
        let mut bounds = HashMap::new();
        bounds.insert(ElementId(0), Rect::new(0.0, 0.0, 100.0, 100.0));
        bounds.insert(ElementId(1), Rect::new(0.0, 650.0, 100.0, 100.0));
        bounds.insert(ElementId(2), Rect::new(0.0, 3000.0, 100.0, 100.0));
        FixedGeometry {
            viewport: Rect::new(0.0, 0.0, 800.0, 600.0),
            bounds,
        }
    }

    #[test]
    fn test_no_trigger_below_threshold() {
        let mut monitor = VisibilityMonitor::new(0.5, RootMargin::px(0.0));
        monitor.observe(ElementId(0));

        assert!(!monitor.on_intersection(ElementId(0), 0.0));
        assert!(!monitor.on_intersection(ElementId(0), 0.49));
        assert!(monitor.is_observed(ElementId(0)));
    }

    #[test]
    fn test_trigger_at_threshold_is_one_shot() {
        let mut monitor = VisibilityMonitor::new(0.5, RootMargin::px(0.0));
        monitor.observe(ElementId(0));

        assert!(monitor.on_intersection(ElementId(0), 0.5));
        assert!(!monitor.is_observed(ElementId(0)));
        assert!(monitor.has_fired(ElementId(0)));
        assert!(!monitor.on_intersection(ElementId(0), 1.0));

        // Re-observing a fired element is refused
        assert!(!monitor.observe(ElementId(0)));
    }

    #[test]
    fn test_unobserved_element_never_fires() {
        let mut monitor = VisibilityMonitor::new(0.1, RootMargin::px(0.0));
        assert!(!monitor.on_intersection(ElementId(7), 1.0));
    }

    #[test]
    fn test_zero_threshold_needs_some_overlap() {
        let mut monitor = VisibilityMonitor::new(0.0, RootMargin::px(0.0));
        monitor.observe(ElementId(0));

        assert!(!monitor.on_intersection(ElementId(0), 0.0));
        assert!(monitor.on_intersection(ElementId(0), 0.01));
    }

    #[test]
    fn test_threshold_clamped() {
        assert_eq!(VisibilityMonitor::new(3.0, RootMargin::default()).threshold(), 1.0);
        assert_eq!(VisibilityMonitor::new(-1.0, RootMargin::default()).threshold(), 0.0);
    }

    #[test]
    fn test_sweep_uses_margin() {
        let geometry = page();

        let mut tight = VisibilityMonitor::new(0.1, RootMargin::px(0.0));
        tight.observe_all([ElementId(0), ElementId(1), ElementId(2)]);
        assert_eq!(tight.sweep(&geometry), vec![ElementId(0)]);

        let mut loose = VisibilityMonitor::new(0.1, RootMargin::px(100.0));
        loose.observe_all([ElementId(0), ElementId(1), ElementId(2)]);
        assert_eq!(loose.sweep(&geometry), vec![ElementId(0), ElementId(1)]);
        assert_eq!(loose.observed().collect::<Vec<_>>(), vec![ElementId(2)]);
    }

    #[test]
    fn test_sweep_skips_detached_elements() {
        let geometry = page();
        let mut monitor = VisibilityMonitor::new(0.1, RootMargin::px(0.0));
        monitor.observe(ElementId(42));

        assert!(monitor.sweep(&geometry).is_empty());
        assert!(monitor.is_observed(ElementId(42)));
    }

    #[test]
    fn test_is_intersecting() {
        let geometry = page();
        let monitor = VisibilityMonitor::new(0.1, RootMargin::px(0.0));

        assert!(monitor.is_intersecting(ElementId(0), &geometry));
        assert!(!monitor.is_intersecting(ElementId(2), &geometry));
        assert!(!monitor.is_intersecting(ElementId(42), &geometry));
    }

    #[test]
    fn test_observe_all_counts_new_only() {
        let mut monitor = VisibilityMonitor::new(0.1, RootMargin::default());
        assert_eq!(monitor.observe_all([ElementId(0), ElementId(1)]), 2);
        assert_eq!(monitor.observe_all([ElementId(1), ElementId(2)]), 1);
        assert_eq!(monitor.len(), 3);
    }
}
