//! Resource classification and load targets
//!
//! A resolved source is classified into one of four kinds. The kind picks the
//! type handler; the [`LoadTarget`] carries the resolved URL together with
//! the descriptor fields that handler needs to render the final markup.

use maud::html;

use crate::element::{ElementDescriptor, FrameOptions, VideoOptions};

/// Extensions classified as images
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "svg", "bmp", "ico",
];

/// Extensions classified as video
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "ogv", "mov", "m4v"];

/// What kind of resource a source is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Video,
    /// Absolute or protocol-relative URL embedded as a frame
    Frame,
    /// Anything else, fetched as text
    Fetch,
}

impl ResourceKind {
    /// Parse a `data-type` hint
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "image" | "img" => Some(Self::Image),
            "video" => Some(Self::Video),
            "iframe" | "frame" | "embed" => Some(Self::Frame),
            "fetch" | "html" | "text" => Some(Self::Fetch),
            _ => None,
        }
    }

    /// Classify a source URL by pattern
    pub fn classify(url: &str) -> Self {
        match extension(url) {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Self::Image,
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => Self::Video,
            _ if is_absolute(url) => Self::Frame,
            _ => Self::Fetch,
        }
    }

    /// Destination hint for prefetching
    pub fn hint_type(self) -> HintType {
        match self {
            Self::Image => HintType::Image,
            Self::Video => HintType::Video,
            Self::Frame | Self::Fetch => HintType::Fetch,
        }
    }
}

/// Type tag attached to prefetch hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintType {
    Image,
    Video,
    Fetch,
}

impl HintType {
    pub fn as_str(self) -> &'static str {
        match self {
            HintType::Image => "image",
            HintType::Video => "video",
            HintType::Fetch => "fetch",
        }
    }
}

/// Lower-case file extension of a URL path, ignoring query and fragment
pub fn extension(url: &str) -> Option<String> {
    let path = strip_suffixes(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether a URL is absolute (`http:`, `https:`) or protocol-relative
pub fn is_absolute(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// URL without its query string and fragment
fn strip_suffixes(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Per-instance presentation overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    pub width: Option<String>,
    pub height: Option<String>,
    pub class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePayload {
    pub alt: Option<String>,
    pub srcset: Option<String>,
    pub sizes: Option<String>,
    pub loading: Option<String>,
    pub presentation: Presentation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoPayload {
    pub options: VideoOptions,
    pub presentation: Presentation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramePayload {
    pub title: Option<String>,
    pub loading: Option<String>,
    pub options: FrameOptions,
    pub presentation: Presentation,
}

/// A resolved source bound to its type handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    Image { url: String, image: ImagePayload },
    Video { url: String, video: VideoPayload },
    Frame { url: String, frame: FramePayload },
    Fetch { url: String },
}

impl LoadTarget {
    /// Bind `url` to the handler for `kind`
    ///
    /// `srcset` is the native source-set to hand to an image, when resolution
    /// was deferred to it.
    pub fn new(
        kind: ResourceKind,
        url: String,
        descriptor: &ElementDescriptor,
        srcset: Option<&str>,
    ) -> Self {
        let presentation = Presentation {
            width: descriptor.width.clone(),
            height: descriptor.height.clone(),
            class: descriptor.class.clone(),
        };

        match kind {
            ResourceKind::Image => LoadTarget::Image {
                url,
                image: ImagePayload {
                    alt: descriptor.alt.clone(),
                    srcset: srcset.map(str::to_string),
                    sizes: srcset.and(descriptor.sizes.clone()),
                    loading: descriptor.loading.clone(),
                    presentation,
                },
            },
            ResourceKind::Video => LoadTarget::Video {
                url,
                video: VideoPayload {
                    options: descriptor.video.clone(),
                    presentation,
                },
            },
            ResourceKind::Frame => LoadTarget::Frame {
                url,
                frame: FramePayload {
                    title: descriptor.title.clone().or_else(|| descriptor.alt.clone()),
                    loading: descriptor.loading.clone(),
                    options: descriptor.frame.clone(),
                    presentation,
                },
            },
            ResourceKind::Fetch => LoadTarget::Fetch { url },
        }
    }

    pub fn url(&self) -> &str {
        match self {
            LoadTarget::Image { url, .. }
            | LoadTarget::Video { url, .. }
            | LoadTarget::Frame { url, .. }
            | LoadTarget::Fetch { url } => url,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            LoadTarget::Image { .. } => ResourceKind::Image,
            LoadTarget::Video { .. } => ResourceKind::Video,
            LoadTarget::Frame { .. } => ResourceKind::Frame,
            LoadTarget::Fetch { .. } => ResourceKind::Fetch,
        }
    }

    /// Markup for a loaded media target
    ///
    /// Generic fetches render their fetched body instead and yield `None`.
    pub fn markup(&self) -> Option<String> {
        let markup = match self {
            LoadTarget::Image { url, image } => {
                let p = &image.presentation;
                html! {
                    img src=(url)
                        srcset=[image.srcset.as_deref()]
                        sizes=[image.sizes.as_deref()]
                        alt=(image.alt.as_deref().unwrap_or(""))
                        loading=[image.loading.as_deref()]
                        width=[p.width.as_deref()]
                        height=[p.height.as_deref()]
                        class=[p.class.as_deref()];
                }
            }
            LoadTarget::Video { url, video } => {
                let options = &video.options;
                let p = &video.presentation;
                html! {
                    video src=(url)
                        controls[options.controls]
                        autoplay[options.autoplay]
                        loop[options.looped]
                        muted[options.muted]
                        playsinline[options.plays_inline]
                        preload=[options.preload.as_deref()]
                        width=[p.width.as_deref()]
                        height=[p.height.as_deref()]
                        class=[p.class.as_deref()] {}
                }
            }
            LoadTarget::Frame { url, frame } => {
                let p = &frame.presentation;
                html! {
                    iframe src=(url)
                        title=[frame.title.as_deref()]
                        allowfullscreen[frame.options.allow_fullscreen]
                        sandbox=[frame.options.sandbox.as_deref()]
                        loading=[frame.loading.as_deref()]
                        width=[p.width.as_deref()]
                        height=[p.height.as_deref()]
                        class=[p.class.as_deref()] {}
                }
            }
            LoadTarget::Fetch { .. } => return None,
        };
        Some(markup.into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension("/a/b.c/photo.png?w=300#top").as_deref(), Some("png"));
        assert_eq!(extension("https://example.com/watch"), None);
        assert_eq!(extension(".hidden"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn test_classification() {
        assert_eq!(ResourceKind::classify("photo.jpg"), ResourceKind::Image);
        assert_eq!(ResourceKind::classify("https://cdn.test/a.webp"), ResourceKind::Image);
        assert_eq!(ResourceKind::classify("clip.MP4"), ResourceKind::Video);
        assert_eq!(ResourceKind::classify("https://maps.test/embed"), ResourceKind::Frame);
        assert_eq!(ResourceKind::classify("//player.test/v/1"), ResourceKind::Frame);
        assert_eq!(ResourceKind::classify("partials/footer.html"), ResourceKind::Fetch);
        assert_eq!(ResourceKind::classify("/api/widget"), ResourceKind::Fetch);
    }

    #[test]
    fn test_hints() {
        assert_eq!(ResourceKind::from_hint("IFRAME"), Some(ResourceKind::Frame));
        assert_eq!(ResourceKind::from_hint("img"), Some(ResourceKind::Image));
        assert_eq!(ResourceKind::from_hint("audio"), None);
        assert_eq!(ResourceKind::Video.hint_type(), HintType::Video);
        assert_eq!(ResourceKind::Frame.hint_type().as_str(), "fetch");
    }

    #[test]
    fn test_image_markup() {
        let mut descriptor = ElementDescriptor::with_src("photo.jpg");
        descriptor.alt = Some("A \"quoted\" <cat>".to_string());
        descriptor.width = Some("640".to_string());
        descriptor.sizes = Some("100vw".to_string());

        let target = LoadTarget::new(ResourceKind::Image, "photo.webp".to_string(), &descriptor, None);
        assert_eq!(
            target.markup().unwrap(),
            "<img src=\"photo.webp\" alt=\"A &quot;quoted&quot; &lt;cat&gt;\" width=\"640\">"
        );
    }

    #[test]
    fn test_image_markup_with_srcset() {
        let mut descriptor = ElementDescriptor::with_src("photo.jpg");
        descriptor.sizes = Some("50vw".to_string());

        let target = LoadTarget::new(
            ResourceKind::Image,
            "photo.jpg".to_string(),
            &descriptor,
            Some("photo-1x.jpg 1x, photo-2x.jpg 2x"),
        );
        assert_eq!(
            target.markup().unwrap(),
            "<img src=\"photo.jpg\" srcset=\"photo-1x.jpg 1x, photo-2x.jpg 2x\" sizes=\"50vw\" alt=\"\">"
        );
    }

    #[test]
    fn test_video_markup() {
        let mut descriptor = ElementDescriptor::with_src("clip.mp4");
        descriptor.video.controls = true;
        descriptor.video.muted = true;
        descriptor.video.preload = Some("none".to_string());
        descriptor.class = Some("hero".to_string());

        let target = LoadTarget::new(ResourceKind::Video, "clip.mp4".to_string(), &descriptor, None);
        assert_eq!(
            target.markup().unwrap(),
            "<video src=\"clip.mp4\" controls muted preload=\"none\" class=\"hero\"></video>"
        );
    }

    #[test]
    fn test_frame_markup() {
        let mut descriptor = ElementDescriptor::with_src("https://maps.test/embed?q=a&b");
        descriptor.alt = Some("Map".to_string());
        descriptor.frame.allow_fullscreen = true;
        descriptor.frame.sandbox = Some("allow-scripts".to_string());

        let url = descriptor.src.clone().unwrap();
        let target = LoadTarget::new(ResourceKind::Frame, url, &descriptor, None);
        assert_eq!(
            target.markup().unwrap(),
            "<iframe src=\"https://maps.test/embed?q=a&amp;b\" title=\"Map\" allowfullscreen sandbox=\"allow-scripts\"></iframe>"
        );
    }

    #[test]
    fn test_fetch_has_no_markup() {
        let descriptor = ElementDescriptor::with_src("footer.html");
        let target = LoadTarget::new(ResourceKind::Fetch, "footer.html".to_string(), &descriptor, None);
        assert_eq!(target.markup(), None);
        assert_eq!(target.kind(), ResourceKind::Fetch);
        assert_eq!(target.url(), "footer.html");
    }
}
