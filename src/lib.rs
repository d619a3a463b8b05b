//! Tweetpress
//!
//! Renders social posts into PNG cards with a headless Chrome and bundles the
//! cards of one request into a PDF, one page per card.
//!
//! # Pipeline
//!
//! - [`template`] turns a [`ContentItem`] into escaped HTML for a [`LayoutVariant`]
//! - [`engine`] abstracts the browser; [`browser::ChromeEngine`] is the CDP backend
//! - [`producer::BatchImageProducer`] renders a batch through one browser session
//! - [`document::DocumentBuilder`] assembles the PNGs into a paginated PDF
//! - [`server`] exposes the pipeline over HTTP
//!
//! # Example
//!
//! ```no_run
//! use tweetpress::{AuthorRef, ContentItem, EngineConfig, LayoutVariant};
//! use tweetpress::browser::ChromeEngine;
//! use tweetpress::document::{DocumentBuilder, PageSizing};
//! use tweetpress::producer::BatchImageProducer;
//!
//! # async fn run() -> tweetpress::Result<()> {
//! let producer = BatchImageProducer::new(ChromeEngine::new(EngineConfig::default()));
//! let items = vec![ContentItem::new("hello", AuthorRef::new("A", "a"))];
//! let images = producer.produce(&items, LayoutVariant::Square).await?;
//! let pdf = DocumentBuilder::new(PageSizing::MatchImage).build(&images)?;
//! assert_eq!(pdf.page_count, 1);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub mod document;
pub mod engine;
pub mod model;
pub mod producer;
pub mod server;
pub mod template;
pub mod workdir;

#[cfg(feature = "cdp")]
pub mod cdp;

// Async facade over the blocking CDP driver
#[cfg(feature = "cdp")]
pub mod browser;

pub use engine::{RenderEngine, RenderSession, SizingPolicy};
pub use model::{AuthorRef, ContentItem, Document, RenderedImage};
pub use template::LayoutVariant;

/// Configuration for the browser engine
///
/// The defaults match a containerized deployment: Chrome's sandbox is off
/// (the container is the sandbox) and the binary is discovered on `PATH`.
///
/// # Examples
///
/// ```
/// let cfg = tweetpress::EngineConfig::default();
/// assert!(!cfg.sandbox);
/// assert_eq!(cfg.settle_timeout_ms, 10_000);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit Chrome/Chromium binary; `None` lets the launcher search
    pub chrome_path: Option<PathBuf>,
    /// Whether to keep Chrome's own sandbox enabled
    pub sandbox: bool,
    /// Bound for navigation and individual CDP calls in milliseconds
    pub navigation_timeout_ms: u64,
    /// Bound for embedded resources to settle in milliseconds
    pub settle_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: false,
            navigation_timeout_ms: 30_000,
            settle_timeout_ms: 10_000,
        }
    }
}

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
