//! Resource resolution
//!
//! Picks the single best URL for an element from its declared alternates,
//! the current network snapshot and the viewport width. Resolution is
//! recomputed on every call; nothing here is cached.

use std::collections::BTreeMap;

use tracing::warn;

use crate::element::ElementDescriptor;
use crate::error::ResolveError;
use crate::network::NetworkState;
use crate::resource::extension;

/// Extensions that have an optimized-format counterpart
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extension of the optimized format
pub const OPTIMIZED_EXTENSION: &str = "webp";

/// Outcome of resolving an element's source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Load exactly this URL
    Url(String),

    /// Load the primary source and let the host pick from the source-set
    Native { src: String, srcset: String },
}

impl Resolution {
    /// URL the dispatcher fetches
    pub fn url(&self) -> &str {
        match self {
            Resolution::Url(url) => url,
            Resolution::Native { src, .. } => src,
        }
    }

    /// Source-set handed to the markup, if resolution was deferred
    pub fn srcset(&self) -> Option<&str> {
        match self {
            Resolution::Url(_) => None,
            Resolution::Native { srcset, .. } => Some(srcset),
        }
    }
}

/// Width-keyed alternates from a breakpoint map
///
/// # Example
///
/// ```
/// use ecofull_core::Breakpoints;
///
/// let bp = Breakpoints::parse(r#"{"320":"a.jpg","768":"b.jpg","1200":"c.jpg"}"#).unwrap();
/// assert_eq!(bp.select(900.0), Some("b.jpg"));
/// assert_eq!(bp.select(200.0), Some("a.jpg"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakpoints {
    widths: BTreeMap<u32, String>,
}

impl Breakpoints {
    /// Parse a JSON object of width keys to URLs
    ///
    /// Keys may carry a `px` suffix.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let map: BTreeMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| ResolveError::BreakpointSyntax(e.to_string()))?;

        let mut widths = BTreeMap::new();
        for (key, url) in map {
            let trimmed = key.trim();
            let digits = trimmed.strip_suffix("px").unwrap_or(trimmed);
            let width = digits
                .parse::<u32>()
                .map_err(|_| ResolveError::BreakpointWidth(key.clone()))?;
            widths.insert(width, url);
        }
        Ok(Self { widths })
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Largest breakpoint not wider than `viewport_width`, else the smallest
    pub fn select(&self, viewport_width: f64) -> Option<&str> {
        self.widths
            .iter()
            .rev()
            .find(|(width, _)| f64::from(**width) <= viewport_width)
            .or_else(|| self.widths.iter().next())
            .map(|(_, url)| url.as_str())
    }
}

/// `url` with a convertible extension replaced by the optimized one
///
/// Query strings and fragments are preserved. Returns `None` when the
/// extension is not convertible.
pub fn optimized_name(url: &str) -> Option<String> {
    let ext = extension(url)?;
    if !CONVERTIBLE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }

    let path_end = url.find(['?', '#']).unwrap_or(url.len());
    let (path, suffix) = url.split_at(path_end);
    let stem = &path[..path.len() - ext.len()];
    Some(format!("{stem}{OPTIMIZED_EXTENSION}{suffix}"))
}

/// Pick the source for `descriptor`
///
/// Precedence: low-bandwidth alternate, optimized format, breakpoints or
/// native source-set, primary source. Returns `None` when the element has no
/// primary source.
pub fn resolve(
    descriptor: &ElementDescriptor,
    network: &NetworkState,
    viewport_width: f64,
) -> Option<Resolution> {
    let src = descriptor.src.as_deref()?;

    if network.prefers_low_bandwidth() {
        if let Some(low) = &descriptor.low_src {
            return Some(Resolution::Url(low.clone()));
        }
    }

    if network.supports_optimized_format == Some(true) {
        if let Some(optimized) = optimized_alternate(descriptor, src) {
            return Some(Resolution::Url(optimized));
        }
    }

    if let Some(raw) = &descriptor.breakpoints {
        match Breakpoints::parse(raw) {
            Ok(breakpoints) => {
                if let Some(url) = breakpoints.select(viewport_width) {
                    return Some(Resolution::Url(url.to_string()));
                }
            }
            Err(e) => warn!("ignoring breakpoints for {}: {}", src, e),
        }
    }

    if let Some(srcset) = &descriptor.srcset {
        return Some(Resolution::Native {
            src: src.to_string(),
            srcset: srcset.clone(),
        });
    }

    Some(Resolution::Url(src.to_string()))
}

fn optimized_alternate(descriptor: &ElementDescriptor, src: &str) -> Option<String> {
    let name = optimized_name(src)?;
    Some(descriptor.optimized_src.clone().unwrap_or(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::EffectiveType;

    const BREAKPOINTS: &str = r#"{"320": "a.jpg", "768": "b.jpg", "1200": "c.jpg"}"#;

    fn responsive() -> ElementDescriptor {
        let mut descriptor = ElementDescriptor::with_src("base.jpg");
        descriptor.breakpoints = Some(BREAKPOINTS.to_string());
        descriptor
    }

    fn resolved(descriptor: &ElementDescriptor, network: &NetworkState, width: f64) -> String {
        resolve(descriptor, network, width).unwrap().url().to_string()
    }

    #[test]
    fn test_breakpoint_selection() {
        let network = NetworkState::default();
        let descriptor = responsive();
        assert_eq!(resolved(&descriptor, &network, 900.0), "b.jpg");
        assert_eq!(resolved(&descriptor, &network, 200.0), "a.jpg");
        assert_eq!(resolved(&descriptor, &network, 1400.0), "c.jpg");
        assert_eq!(resolved(&descriptor, &network, 768.0), "b.jpg");
    }

    #[test]
    fn test_breakpoint_parse_errors() {
        assert!(matches!(
            Breakpoints::parse("not json"),
            Err(ResolveError::BreakpointSyntax(_))
        ));
        assert!(matches!(
            Breakpoints::parse(r#"{"wide": "a.jpg"}"#),
            Err(ResolveError::BreakpointWidth(_))
        ));

        let bp = Breakpoints::parse(r#"{"480px": "s.jpg"}"#).unwrap();
        assert_eq!(bp.select(1000.0), Some("s.jpg"));
        assert!(Breakpoints::parse("{}").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_breakpoints_fall_back_to_primary() {
        let mut descriptor = ElementDescriptor::with_src("base.jpg");
        descriptor.breakpoints = Some("{320: a.jpg}".to_string());
        assert_eq!(resolved(&descriptor, &NetworkState::default(), 900.0), "base.jpg");
    }

    #[test]
    fn test_optimized_name() {
        assert_eq!(optimized_name("photo.jpg").as_deref(), Some("photo.webp"));
        assert_eq!(optimized_name("img/Photo.PNG?v=2#x").as_deref(), Some("img/Photo.webp?v=2#x"));
        assert_eq!(optimized_name("anim.gif"), None);
        assert_eq!(optimized_name("already.webp"), None);
    }

    #[test]
    fn test_format_substitution() {
        let network = NetworkState {
            supports_optimized_format: Some(true),
            ..NetworkState::default()
        };
        let descriptor = ElementDescriptor::with_src("photo.jpg");
        assert_eq!(resolved(&descriptor, &network, 1024.0), "photo.webp");

        let mut declared = ElementDescriptor::with_src("photo.jpg");
        declared.optimized_src = Some("cdn/photo-opt.webp".to_string());
        assert_eq!(resolved(&declared, &network, 1024.0), "cdn/photo-opt.webp");

        // unknown support never substitutes
        assert_eq!(resolved(&descriptor, &NetworkState::default(), 1024.0), "photo.jpg");
    }

    #[test]
    fn test_format_beats_breakpoints() {
        let network = NetworkState {
            supports_optimized_format: Some(true),
            ..NetworkState::default()
        };
        assert_eq!(resolved(&responsive(), &network, 900.0), "base.webp");
    }

    #[test]
    fn test_low_bandwidth_alternate() {
        let mut descriptor = ElementDescriptor::with_src("photo.jpg");
        descriptor.low_src = Some("photo-lq.jpg".to_string());

        let reduced = NetworkState {
            reduced_data: true,
            supports_optimized_format: Some(true),
            ..NetworkState::default()
        };
        assert_eq!(resolved(&descriptor, &reduced, 1024.0), "photo-lq.jpg");

        let slow = NetworkState {
            effective_type: EffectiveType::Slow2g,
            ..NetworkState::default()
        };
        assert_eq!(resolved(&descriptor, &slow, 1024.0), "photo-lq.jpg");

        let fast_3g = NetworkState {
            effective_type: EffectiveType::ThreeG,
            ..NetworkState::default()
        };
        assert_eq!(resolved(&descriptor, &fast_3g, 1024.0), "photo.jpg");
    }

    #[test]
    fn test_native_srcset() {
        let mut descriptor = ElementDescriptor::with_src("photo.jpg");
        descriptor.srcset = Some("photo-1x.jpg 1x, photo-2x.jpg 2x".to_string());

        let resolution = resolve(&descriptor, &NetworkState::default(), 800.0).unwrap();
        assert_eq!(resolution.url(), "photo.jpg");
        assert_eq!(resolution.srcset(), Some("photo-1x.jpg 1x, photo-2x.jpg 2x"));
    }

    #[test]
    fn test_missing_source() {
        let mut descriptor = ElementDescriptor::default();
        descriptor.low_src = Some("lq.jpg".to_string());
        assert_eq!(resolve(&descriptor, &NetworkState::default(), 800.0), None);
    }
}
