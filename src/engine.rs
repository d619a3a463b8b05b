//! Rendering-engine abstraction
//!
//! A [`RenderEngine`] starts isolated browser sessions; a [`RenderSession`]
//! turns markup into a [`RenderedImage`]. The Chrome-backed implementation
//! lives in [`crate::browser`]; tests substitute their own.

use crate::model::RenderedImage;
use crate::{Result, Viewport};
use async_trait::async_trait;

/// How the capture size of a snapshot is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizingPolicy {
    /// Capture exactly this viewport
    Fixed(Viewport),
    /// Lay out at `width`, measure the body, capture `width × body height`
    FitContent { width: u32 },
    /// Wait for `selector` and capture its bounding box
    FitElement { selector: String, viewport: Viewport },
}

impl SizingPolicy {
    /// Viewport the page is laid out in before any measurement
    pub fn initial_viewport(&self) -> Viewport {
        match self {
            SizingPolicy::Fixed(viewport) => *viewport,
            SizingPolicy::FitContent { width } => Viewport {
                width: *width,
                height: 1000,
            },
            SizingPolicy::FitElement { viewport, .. } => *viewport,
        }
    }

    /// Selector that must be present before the page counts as settled
    pub fn ready_selector(&self) -> Option<&str> {
        match self {
            SizingPolicy::FitElement { selector, .. } => Some(selector),
            _ => None,
        }
    }
}

/// Factory for browser sessions.
///
/// Implementations must give every session its own engine instance; sessions
/// are never shared between callers.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    type Session: RenderSession;

    /// Start one engine instance. Fails with `Error::EngineUnavailable`.
    async fn open(&self) -> Result<Self::Session>;
}

/// One live engine instance.
///
/// `close` must be called once per successful `open`. Dropping a session
/// without closing it still tears the engine down, but without reporting
/// shutdown errors.
#[async_trait]
pub trait RenderSession: Send {
    /// Load `markup` into a fresh document, settle its images, size the
    /// capture per `sizing` and return a transparent-background PNG.
    async fn render_to_image(&mut self, markup: &str, sizing: &SizingPolicy) -> Result<RenderedImage>;

    /// Terminate the engine instance
    async fn close(self) -> Result<()>;
}
