//! Error types for the selection and capture pipeline

use crate::capture::CaptureRequest;
use thiserror::Error;

/// Result type alias for snip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while selecting or capturing a region
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The supplied markup could not be rendered
    #[error("Content rendering failed: {0}")]
    ContentError(String),

    /// The rasterizer rejected a well-formed capture request
    #[error("Rasterization failed for {request}: {reason}")]
    RasterizationFailure {
        /// The snapshot the failed capture was started with
        request: CaptureRequest,
        /// Rasterizer-provided reason
        reason: String,
    },

    /// Scroll offset or document extents could not be read
    #[error("Viewport metrics unavailable: {0}")]
    MetricsUnavailable(String),

    /// The capture worker went away before replying
    #[error("Capture canceled: {0}")]
    CaptureCanceled(String),

    /// Pixel data could not be encoded
    #[error("Image encoding failed: {0}")]
    EncodeError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborted a capture (as opposed to a setup problem)
    pub fn is_capture_failure(&self) -> bool {
        matches!(
            self,
            Error::RasterizationFailure { .. }
                | Error::MetricsUnavailable(_)
                | Error::CaptureCanceled(_)
                | Error::EncodeError(_)
        )
    }
}

#[cfg(feature = "raster")]
impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodeError(err.to_string())
    }
}
