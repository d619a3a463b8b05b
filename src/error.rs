//! Error types for the render pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering posts or assembling the document
#[derive(Error, Debug)]
pub enum Error {
    /// The browser process could not be started
    #[error("Rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The browser process died or dropped its connection mid-operation
    #[error("Rendering engine crashed: {0}")]
    EngineCrashed(String),

    /// Navigation or resource settling exceeded its bound
    #[error("Render timed out after {0}ms")]
    RenderTimeout(u64),

    /// The page loaded but could not be measured or captured
    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    /// The paginated document could not be assembled
    #[error("Document build failed: {0}")]
    DocumentBuild(String),

    /// Working-file I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "cdp")]
impl Error {
    /// Classify a `headless_chrome` failure by the concrete error behind the
    /// `anyhow` wrapper.
    pub fn from_cdp(err: anyhow::Error, timeout_ms: u64) -> Self {
        use headless_chrome::browser::ConnectionClosed;
        use headless_chrome::util::Timeout;

        if err.downcast_ref::<Timeout>().is_some() {
            Error::RenderTimeout(timeout_ms)
        } else if err.downcast_ref::<ConnectionClosed>().is_some() {
            Error::EngineCrashed(err.to_string())
        } else {
            Error::RenderFailed(err.to_string())
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::DocumentBuild(err.to_string())
    }
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Error::DocumentBuild(format!("PNG decode failed: {}", err))
    }
}
