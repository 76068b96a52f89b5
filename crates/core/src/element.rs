//! Trackable elements and their load state
//!
//! Elements live in an arena indexed by [`ElementId`] in document order.
//! Each record pairs the declared descriptor with the mutable load state the
//! dispatcher drives.

use std::collections::BTreeMap;

use crate::resource::ResourceKind;
use ecofull_scheduler::ElementId;

/// Declarative attributes of one element
///
/// # Example
///
/// ```
/// use ecofull_core::AttributeMap;
///
/// let attrs = AttributeMap::from_pairs([("data-src", "photo.jpg"), ("data-muted", "")]);
/// assert_eq!(attrs.get("data-src"), Some("photo.jpg"));
/// assert!(attrs.flag("data-muted"));
/// assert!(!attrs.flag("data-loop"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    values: BTreeMap<String, String>,
}

impl AttributeMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key-value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set an attribute
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Attribute value, with blank values treated as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Boolean attribute: present and not `"false"`
    pub fn flag(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(v) => !v.trim().eq_ignore_ascii_case("false"),
            None => false,
        }
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

/// Video element flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoOptions {
    pub controls: bool,
    pub autoplay: bool,
    pub looped: bool,
    pub muted: bool,
    pub plays_inline: bool,
    pub preload: Option<String>,
}

/// Embedded frame flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOptions {
    pub allow_fullscreen: bool,
    pub sandbox: Option<String>,
}

/// Everything an element declares about what to load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementDescriptor {
    /// Primary source (`data-src`)
    pub src: Option<String>,

    /// Low-bandwidth alternate (`data-src-low`)
    pub low_src: Option<String>,

    /// Optimized-format alternate (`data-src-webp`)
    pub optimized_src: Option<String>,

    /// Raw breakpoint map, parsed on every resolution (`data-breakpoints`)
    pub breakpoints: Option<String>,

    /// Native responsive source-set (`data-srcset`)
    pub srcset: Option<String>,

    /// Sizes for the native source-set (`data-sizes`)
    pub sizes: Option<String>,

    /// Media type hint overriding classification (`data-type`)
    pub kind_hint: Option<ResourceKind>,

    /// Accessibility text (`data-alt`)
    pub alt: Option<String>,

    /// Frame title (`data-title`)
    pub title: Option<String>,

    /// Width override (`data-width`)
    pub width: Option<String>,

    /// Height override (`data-height`)
    pub height: Option<String>,

    /// Extra class (`data-class`)
    pub class: Option<String>,

    /// Loading strategy hint (`data-loading`)
    pub loading: Option<String>,

    /// Explicit responsive marker (`data-responsive`)
    pub responsive: bool,

    pub video: VideoOptions,
    pub frame: FrameOptions,
}

impl ElementDescriptor {
    /// Read a descriptor from declarative attributes
    pub fn from_attributes(attrs: &AttributeMap) -> Self {
        Self {
            src: attrs.owned("data-src"),
            low_src: attrs.owned("data-src-low"),
            optimized_src: attrs.owned("data-src-webp"),
            breakpoints: attrs.owned("data-breakpoints"),
            srcset: attrs.owned("data-srcset"),
            sizes: attrs.owned("data-sizes"),
            kind_hint: attrs.get("data-type").and_then(ResourceKind::from_hint),
            alt: attrs.owned("data-alt"),
            title: attrs.owned("data-title"),
            width: attrs.owned("data-width"),
            height: attrs.owned("data-height"),
            class: attrs.owned("data-class"),
            loading: attrs.owned("data-loading"),
            responsive: attrs.flag("data-responsive"),
            video: VideoOptions {
                controls: attrs.flag("data-controls"),
                autoplay: attrs.flag("data-autoplay"),
                looped: attrs.flag("data-loop"),
                muted: attrs.flag("data-muted"),
                plays_inline: attrs.flag("data-playsinline"),
                preload: attrs.owned("data-preload"),
            },
            frame: FrameOptions {
                allow_fullscreen: attrs.flag("data-allowfullscreen"),
                sandbox: attrs.owned("data-sandbox"),
            },
        }
    }

    /// Descriptor with only a primary source
    pub fn with_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    /// Whether the element reacts to viewport size changes
    pub fn is_responsive(&self) -> bool {
        self.responsive || self.breakpoints.is_some() || self.srcset.is_some()
    }
}

/// Load state of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Not yet triggered
    #[default]
    Idle,
    /// Placeholder shown, load in flight
    Loading,
    /// Final content rendered
    Loaded,
    /// Fallback content rendered
    Error,
}

impl LoadState {
    /// Whether the state machine allows `self -> next`
    ///
    /// Loaded -> Loading is only reachable through a forced reload.
    pub fn can_transition_to(self, next: LoadState) -> bool {
        matches!(
            (self, next),
            (LoadState::Idle, LoadState::Loading)
                | (LoadState::Loading, LoadState::Loaded)
                | (LoadState::Loading, LoadState::Error)
                | (LoadState::Error, LoadState::Loading)
        )
    }
}

/// Arena record for one element
#[derive(Debug, Clone)]
pub struct ElementRecord {
    pub id: ElementId,
    pub descriptor: ElementDescriptor,
    pub state: LoadState,

    /// Retries made by the current load
    pub retry_count: u32,

    /// Cache key of the last load (the original source)
    pub resolved_key: Option<String>,

    /// URL the last load fetched
    pub resolved_url: Option<String>,
}

impl ElementRecord {
    fn new(id: ElementId, descriptor: ElementDescriptor) -> Self {
        Self {
            id,
            descriptor,
            state: LoadState::Idle,
            retry_count: 0,
            resolved_key: None,
            resolved_url: None,
        }
    }

    /// Enter Loading
    ///
    /// Refused while a load is in flight, and for Loaded elements unless
    /// `force` is set. Resets the retry counter.
    pub fn begin_load(&mut self, force: bool) -> bool {
        let allowed = match self.state {
            LoadState::Loaded => force,
            state => state.can_transition_to(LoadState::Loading),
        };

        if allowed {
            self.state = LoadState::Loading;
            self.retry_count = 0;
        }
        allowed
    }

    /// Leave Loading for `outcome` (Loaded or Error)
    pub fn finish(&mut self, outcome: LoadState) -> bool {
        if self.state.can_transition_to(outcome) {
            self.state = outcome;
            if outcome == LoadState::Loaded {
                self.retry_count = 0;
            }
            true
        } else {
            false
        }
    }
}

/// All trackable elements, in document order
#[derive(Debug, Clone, Default)]
pub struct ElementArena {
    records: Vec<ElementRecord>,
}

impl ElementArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element, returning its id
    pub fn insert(&mut self, descriptor: ElementDescriptor) -> ElementId {
        let id = ElementId(self.records.len());
        self.records.push(ElementRecord::new(id, descriptor));
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementRecord> {
        self.records.get(id.0)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementRecord> {
        self.records.get_mut(id.0)
    }

    /// Records in document order
    pub fn iter(&self) -> impl Iterator<Item = &ElementRecord> {
        self.records.iter()
    }

    /// All ids in document order
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.records.iter().map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First Idle element after `id` that declares a source
    pub fn next_pending_after(&self, id: ElementId) -> Option<&ElementRecord> {
        self.records
            .iter()
            .skip(id.0 + 1)
            .find(|r| r.state == LoadState::Idle && r.descriptor.src.is_some())
    }
}
