//! Viewport geometry and intersection ratios
//!
//! The visible region is the viewport rectangle expanded by a root margin.
//! An element's visibility is the fraction of its own area that falls inside
//! that region, matching how intersection observers report ratios.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::monitor::ElementId;

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f64,

    /// Top edge
    pub y: f64,

    /// Width (never negative for a well-formed rect)
    pub width: f64,

    /// Height (never negative for a well-formed rect)
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area, clamped at zero
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Whether the point lies inside or on the edge of this rectangle
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Overlapping region of two rectangles, if they overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x_start = self.x.max(other.x);
        let y_start = self.y.max(other.y);
        let x_end = self.right().min(other.right());
        let y_end = self.bottom().min(other.bottom());

        if x_end > x_start && y_end > y_start {
            Some(Rect::new(x_start, y_start, x_end - x_start, y_end - y_start))
        } else {
            None
        }
    }
}

/// One side of a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginLength {
    /// Absolute expansion in pixels
    Px(f64),
    /// Expansion relative to the viewport extent on that axis
    Percent(f64),
}

impl MarginLength {
    /// Resolve to pixels against a viewport extent
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            MarginLength::Px(px) => px,
            MarginLength::Percent(pct) => extent * pct / 100.0,
        }
    }
}

impl FromStr for MarginLength {
    type Err = MarginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || MarginParseError(s.to_string());

        if let Some(pct) = s.strip_suffix('%') {
            pct.trim().parse().map(MarginLength::Percent).map_err(|_| invalid())
        } else {
            // A bare number is taken as pixels
            let px = s.strip_suffix("px").unwrap_or(s);
            px.trim().parse().map(MarginLength::Px).map_err(|_| invalid())
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginLength::Px(px) => write!(f, "{px}px"),
            MarginLength::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Malformed root margin text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid root margin: {0:?}")]
pub struct MarginParseError(pub String);

/// Expansion of the viewport test region, CSS margin shorthand order
///
/// Parses one to four lengths (`"100px"`, `"10% 0px"`, `"5px 10px 15px 20px"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    /// Same length on all four sides
    pub fn uniform(length: MarginLength) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Uniform pixel margin
    pub fn px(px: f64) -> Self {
        Self::uniform(MarginLength::Px(px))
    }

    /// Grow `viewport` by this margin
    pub fn expand(&self, viewport: Rect) -> Rect {
        let top = self.top.resolve(viewport.height);
        let right = self.right.resolve(viewport.width);
        let bottom = self.bottom.resolve(viewport.height);
        let left = self.left.resolve(viewport.width);

        Rect::new(
            viewport.x - left,
            viewport.y - top,
            viewport.width + left + right,
            viewport.height + top + bottom,
        )
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::px(100.0)
    }
}

impl FromStr for RootMargin {
    type Err = MarginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<MarginLength>, _>>()?;

        match parts.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(MarginParseError(s.to_string())),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

impl TryFrom<String> for RootMargin {
    type Error = MarginParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RootMargin> for String {
    fn from(margin: RootMargin) -> Self {
        margin.to_string()
    }
}

/// Host-provided page geometry
pub trait Geometry: Send + Sync {
    /// Current viewport rectangle
    fn viewport(&self) -> Rect;

    /// Bounding box of an element, `None` if it is detached or unknown
    fn bounds(&self, id: ElementId) -> Option<Rect>;
}

/// Fraction of `element` inside the margin-expanded viewport (0.0 to 1.0)
///
/// A zero-area element counts as fully visible when its origin lies inside
/// the expanded region.
pub fn intersection_ratio(element: Rect, viewport: Rect, margin: &RootMargin) -> f64 {
    let root = margin.expand(viewport);

    if element.area() == 0.0 {
        return if root.contains_point(element.x, element.y) {
            1.0
        } else {
            0.0
        };
    }

    match element.intersection(&root) {
        Some(overlap) => (overlap.area() / element.area()).clamp(0.0, 1.0),
        None => 0.0,
    }
}
