//! Error types for the `mediaext` crate.
//!
//! [`MediaExtError`] is the single error type returned by every fallible
//! operation. Variants fall into four groups:
//!
//! - **construction failures** (the source could not be opened or probed),
//! - **precondition violations** (a session was used after release, or
//!   queried with malformed input),
//! - **extension failures** (an extension renderer could not be built),
//! - **plumbing** errors (unsupported URI schemes, `image` decode failures).
//!
//! Missing optional data (no embedded picture, no frame at the requested
//! position) is never an error: those operations return `Ok(None)` or
//! `Ok(false)` instead.

use std::error::Error as StdError;

use image::ImageError;
use thiserror::Error;

/// Boxed error used to carry the cause of an extension renderer failure.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The unified error type for all `mediaext` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediaExtError {
    /// The native layer could not open or probe the media source.
    #[error("Failed to open media source {source_description}: {reason}")]
    SourceOpen {
        /// Human-readable description of the source (path, fd or URL).
        source_description: String,
        /// Why the open failed.
        reason: String,
    },

    /// A query was issued against a session whose handle was released.
    #[error("Session handle was already released")]
    SessionReleased,

    /// A query was issued before any data source was set.
    #[error("Data source is not set; call set_data_source first")]
    DataSourceNotSet,

    /// A frame index below zero was requested.
    #[error("Frame index must be >= 0 (got {0})")]
    InvalidFrameIndex(i64),

    /// The URI scheme cannot be handled directly and must be resolved to a
    /// path or descriptor by the host.
    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    /// An extension renderer failed to construct.
    #[error("Error instantiating extension renderer {renderer}")]
    ExtensionRendererInit {
        /// Name of the renderer that failed.
        renderer: String,
        /// The underlying construction error.
        #[source]
        source: BoxError,
    },

    /// An error from the `image` crate while decoding or converting pixels.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl MediaExtError {
    /// Returns `true` for errors that indicate a programming mistake in the
    /// caller (use after release, missing data source, negative index)
    /// rather than a property of the media.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            MediaExtError::SessionReleased
                | MediaExtError::DataSourceNotSet
                | MediaExtError::InvalidFrameIndex(_)
        )
    }
}
