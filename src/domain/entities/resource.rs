//! Domain types for remotely fetched resources.

use std::sync::Arc;

/// Decoded image payload, shared read-only with every poller.
pub type SharedImage = Arc<image::DynamicImage>;

/// Text payload, shared read-only with every poller.
pub type SharedText = Arc<str>;

/// The kind of resource a request asked for.
///
/// The kind is declared by the caller at request time; the cache never
/// infers it from the downloaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A remote image, decoded into pixels before it is cached.
    Image,
    /// A remote text document, cached verbatim.
    Text,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Result of polling the cache for an image.
#[derive(Debug, Clone)]
pub enum ImagePoll {
    /// This poll was the first sight of the URL and scheduled its download.
    Begin,
    /// The download is still in flight.
    Downloading,
    /// The decoded image is cached and ready to draw.
    Ready(SharedImage),
    /// The download or decode failed; no image will ever become available
    /// for this URL until the cache is cleared.
    Failed,
}

impl ImagePoll {
    /// Returns true if the image is ready for rendering.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns true if the download is scheduled or in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Begin | Self::Downloading)
    }

    /// Returns true if the download failed terminally.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns the cached image, if ready.
    #[must_use]
    pub fn image(&self) -> Option<&SharedImage> {
        match self {
            Self::Ready(image) => Some(image),
            _ => None,
        }
    }
}

/// Result of polling the cache for a text document.
///
/// There is no failed variant: a failed text download stabilizes as
/// `Ready("")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPoll {
    /// This poll was the first sight of the URL and scheduled its download.
    Begin,
    /// The download is still in flight.
    Downloading,
    /// The text is cached; empty if the download failed.
    Ready(SharedText),
}

impl TextPoll {
    /// Returns true if the text is available.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns true if the download is scheduled or in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Begin | Self::Downloading)
    }

    /// Returns the cached text, if available.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Ready(text) => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_poll_states() {
        assert!(ImagePoll::Begin.is_loading());
        assert!(ImagePoll::Downloading.is_loading());
        assert!(!ImagePoll::Failed.is_loading());
        assert!(ImagePoll::Failed.is_failed());

        let image = Arc::new(image::DynamicImage::new_rgb8(2, 2));
        let poll = ImagePoll::Ready(image);
        assert!(poll.is_ready());
        assert_eq!(poll.image().map(|i| i.width()), Some(2));
    }

    #[test]
    fn test_text_poll_states() {
        assert!(TextPoll::Begin.is_loading());
        assert!(TextPoll::Downloading.text().is_none());

        let poll = TextPoll::Ready(Arc::from("hello"));
        assert!(poll.is_ready());
        assert_eq!(poll.text(), Some("hello"));
    }
}
