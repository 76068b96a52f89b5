//! Preconnect and prefetch hints
//!
//! Hints are advisory. The assistant only decides which hints are new; the
//! engine delivers them to the host's [`HintSink`](crate::HintSink).

use std::collections::HashSet;

use url::Url;

use crate::element::ElementDescriptor;

/// Origin (`scheme://host[:port]`) of an absolute or protocol-relative URL
pub fn origin_of(source: &str) -> Option<String> {
    let source = source.trim();
    let parsed = if source.starts_with("//") {
        Url::parse(&format!("https:{source}"))
    } else {
        Url::parse(source)
    }
    .ok()?;

    match parsed.scheme() {
        "http" | "https" => Some(parsed.origin().ascii_serialization()),
        _ => None,
    }
}

/// Tracks which hints have been issued
#[derive(Debug, Default)]
pub struct PreloadAssistant {
    connected: HashSet<String>,
    prefetched: HashSet<String>,
}

impl PreloadAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Origins of `descriptors` not yet preconnected, in first-seen order
    pub fn claim_origins<'a, I>(&mut self, descriptors: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a ElementDescriptor>,
    {
        let mut origins = Vec::new();
        for descriptor in descriptors {
            let sources = [
                descriptor.src.as_deref(),
                descriptor.low_src.as_deref(),
                descriptor.optimized_src.as_deref(),
            ];
            for origin in sources.into_iter().flatten().filter_map(origin_of) {
                if self.connected.insert(origin.clone()) {
                    origins.push(origin);
                }
            }
        }
        origins
    }

    /// Whether `url` still needs a prefetch hint; marks it issued
    pub fn claim_prefetch(&mut self, url: &str) -> bool {
        self.prefetched.insert(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://cdn.example.com/a/photo.jpg?x=1").as_deref(),
            Some("https://cdn.example.com")
        );
        assert_eq!(
            origin_of("http://example.com:8080/v.mp4").as_deref(),
            Some("http://example.com:8080")
        );
        assert_eq!(
            origin_of("//player.example.org/embed/1").as_deref(),
            Some("https://player.example.org")
        );
        assert_eq!(origin_of("images/photo.jpg"), None);
        assert_eq!(origin_of("data:image/png;base64,AAAA"), None);
    }

    #[test]
    fn test_claim_origins_dedupes() {
        let mut first = ElementDescriptor::with_src("https://cdn.example.com/a.jpg");
        first.low_src = Some("https://lq.example.com/a.jpg".to_string());
        let descriptors = vec![
            first,
            ElementDescriptor::with_src("https://cdn.example.com/b.jpg"),
            ElementDescriptor::with_src("local.jpg"),
            ElementDescriptor::default(),
        ];

        let mut assistant = PreloadAssistant::new();
        assert_eq!(
            assistant.claim_origins(&descriptors),
            vec!["https://cdn.example.com", "https://lq.example.com"]
        );
        assert!(assistant.claim_origins(&descriptors).is_empty());
    }

    #[test]
    fn test_claim_prefetch_once() {
        let mut assistant = PreloadAssistant::new();
        assert!(assistant.claim_prefetch("b.jpg"));
        assert!(!assistant.claim_prefetch("b.jpg"));
        assert!(assistant.claim_prefetch("c.jpg"));
    }
}
