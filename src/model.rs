//! Request-scoped data flowing through the pipeline

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// Fallback avatar service keyed by handle
pub const DEFAULT_AVATAR_BASE: &str = "https://unavatar.io/twitter/";

/// Author metadata shown on a card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorRef {
    pub display_name: String,
    pub handle: String,
    pub avatar_url: Option<String>,
}

impl AuthorRef {
    pub fn new(display_name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            handle: handle.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// The explicit avatar, or the default service URL for this handle.
    ///
    /// The handle is pushed as a single path segment so characters like `/`
    /// or `?` cannot change the target. Dot-only handles would be read as
    /// `.`/`..` segments, so their dots are escaped first.
    pub fn resolved_avatar_url(&self) -> String {
        if let Some(url) = self.avatar_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }
        match url::Url::parse(DEFAULT_AVATAR_BASE) {
            Ok(mut base) => {
                if let Ok(mut segments) = base.path_segments_mut() {
                    segments.pop_if_empty().push(&avatar_segment(&self.handle));
                }
                base.to_string()
            }
            Err(_) => format!("{}{}", DEFAULT_AVATAR_BASE, self.handle),
        }
    }
}

fn avatar_segment(handle: &str) -> Cow<'_, str> {
    if !handle.is_empty() && handle.chars().all(|c| c == '.') {
        Cow::Owned(handle.replace('.', "%2E"))
    } else {
        Cow::Borrowed(handle)
    }
}

/// One unit of content rendered as one image and one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Post text, or the post URL for embed captures
    pub text: String,
    pub author: AuthorRef,
    pub created_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    pub fn new(text: impl Into<String>, author: AuthorRef) -> Self {
        Self {
            text: text.into(),
            author,
            created_at: None,
        }
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// An embed capture: the text is the post URL and no author is rendered.
    pub fn embed(url: impl Into<String>) -> Self {
        Self::new(url, AuthorRef::default())
    }
}

/// A PNG snapshot of one rendered item.
///
/// Width and height are read from the PNG header, so they always describe the
/// raster actually held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
    source_index: usize,
}

impl RenderedImage {
    pub fn from_png(png: Vec<u8>, source_index: usize) -> Result<Self> {
        let size = imagesize::blob_size(&png)
            .map_err(|e| Error::RenderFailed(format!("Unreadable screenshot: {:?}", e)))?;
        let width = u32::try_from(size.width)
            .map_err(|_| Error::RenderFailed(format!("Screenshot width {} out of range", size.width)))?;
        let height = u32::try_from(size.height)
            .map_err(|_| Error::RenderFailed(format!("Screenshot height {} out of range", size.height)))?;
        if width == 0 || height == 0 {
            return Err(Error::RenderFailed(format!("Empty screenshot ({}x{})", width, height)));
        }
        Ok(Self {
            png,
            width,
            height,
            source_index,
        })
    }

    pub fn with_source_index(mut self, index: usize) -> Self {
        self.source_index = index;
        self
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png(self) -> Vec<u8> {
        self.png
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn source_index(&self) -> usize {
        self.source_index
    }
}

/// The assembled paginated document
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}
