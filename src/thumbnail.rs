//! Still-frame and cover-art retrieval.
//!
//! [`ThumbnailRetriever`] is a reusable session: point it at a source with
//! [`set_data_source`](ThumbnailRetriever::set_data_source), query as many
//! frames as needed, and release it (or let it drop). Setting a new source
//! releases the previous one first.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mediaext::{MediaExtError, MediaSource, ThumbnailRetriever};
//!
//! let mut retriever = ThumbnailRetriever::new();
//! retriever.set_data_source(&MediaSource::path("input.mp4"))?;
//!
//! if let Some(cover) = retriever.embedded_picture()? {
//!     std::fs::write("cover.jpg", cover).ok();
//! }
//! if let Some(frame) = retriever.frame_at_time(Some(Duration::from_secs(5)))? {
//!     frame.save("frame.png")?;
//! }
//!
//! retriever.release();
//! assert!(matches!(retriever.frame_at_time(None), Err(MediaExtError::SessionReleased)));
//! # Ok::<(), MediaExtError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, RgbaImage};

use crate::backend::NativeBackend;
use crate::configuration::FrameOptions;
use crate::error::MediaExtError;
use crate::ffmpeg_backend::FfmpegBackend;
use crate::session::NativeSession;
use crate::source::MediaSource;

enum RetrieverState<B: NativeBackend> {
    Unset,
    Live(NativeSession<B>),
    Released,
}

/// Reusable session for cover art and single frames.
pub struct ThumbnailRetriever<B: NativeBackend = FfmpegBackend> {
    backend: Arc<B>,
    options: FrameOptions,
    state: RetrieverState<B>,
}

impl ThumbnailRetriever<FfmpegBackend> {
    /// Retriever backed by a fresh [`FfmpegBackend`].
    pub fn new() -> Self {
        Self::with_backend(Arc::new(FfmpegBackend::new()))
    }
}

impl Default for ThumbnailRetriever<FfmpegBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: NativeBackend> ThumbnailRetriever<B> {
    /// Retriever that decodes through `backend`.
    pub fn with_backend(backend: Arc<B>) -> Self {
        Self {
            backend,
            options: FrameOptions::default(),
            state: RetrieverState::Unset,
        }
    }

    /// Output settings for decoded frames.
    #[must_use]
    pub fn with_options(mut self, options: FrameOptions) -> Self {
        self.options = options;
        self
    }

    /// Current output settings.
    pub fn options(&self) -> &FrameOptions {
        &self.options
    }

    /// Open `source`, releasing any previously set source first.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::SourceOpen`] if the source cannot be opened.
    /// The retriever is then left without a data source.
    pub fn set_data_source(&mut self, source: &MediaSource) -> Result<(), MediaExtError> {
        // Dropping the old session releases it before the new one is created.
        self.state = RetrieverState::Unset;
        let session = NativeSession::create(Arc::clone(&self.backend), source)?;
        self.state = RetrieverState::Live(session);
        Ok(())
    }

    /// Container-embedded cover art bytes, without decoding any video.
    ///
    /// # Errors
    ///
    /// Fails with a precondition violation if no source is set or the
    /// retriever was released.
    pub fn embedded_picture(&self) -> Result<Option<Vec<u8>>, MediaExtError> {
        self.session()?
            .query(|backend, handle| backend.embedded_picture(handle))
    }

    /// Cover art decoded into an image.
    ///
    /// # Errors
    ///
    /// Same as [`embedded_picture`](ThumbnailRetriever::embedded_picture),
    /// plus [`MediaExtError::Image`] if the bytes are not a decodable image.
    pub fn embedded_picture_image(&self) -> Result<Option<DynamicImage>, MediaExtError> {
        match self.embedded_picture()? {
            Some(bytes) => Ok(Some(image::load_from_memory(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode the frame nearest `time`. `None` picks a representative frame
    /// one third of the way into the media.
    ///
    /// Returns `Ok(None)` if the source has no decodable video.
    ///
    /// # Errors
    ///
    /// Fails with a precondition violation if no source is set or the
    /// retriever was released.
    pub fn frame_at_time(&self, time: Option<Duration>) -> Result<Option<RgbaImage>, MediaExtError> {
        let options = &self.options;
        self.session()?
            .query(|backend, handle| backend.frame_at_time(handle, time, options))
    }

    /// Decode the `index`-th frame of the video stream, counting from zero.
    ///
    /// Returns `Ok(None)` if the stream has fewer frames.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::InvalidFrameIndex`] for a negative index,
    /// and the usual precondition violations for an unset or released
    /// retriever.
    pub fn frame_at_index(&self, index: i64) -> Result<Option<RgbaImage>, MediaExtError> {
        if index < 0 {
            return Err(MediaExtError::InvalidFrameIndex(index));
        }
        let options = &self.options;
        self.session()?
            .query(|backend, handle| backend.frame_at_index(handle, index as u64, options))
    }

    /// Display rotation of the video stream in degrees.
    ///
    /// # Errors
    ///
    /// Fails with a precondition violation if no source is set or the
    /// retriever was released.
    pub fn rotation_degrees(&self) -> Result<u32, MediaExtError> {
        self.session()?
            .query(|backend, handle| backend.rotation_degrees(handle))
    }

    /// Release the current source. Later calls are no-ops; queries fail with
    /// [`MediaExtError::SessionReleased`] until a new source is set.
    pub fn release(&mut self) {
        if let RetrieverState::Live(session) = &mut self.state {
            session.release();
        }
        self.state = RetrieverState::Released;
    }

    /// Alias for [`release`](ThumbnailRetriever::release).
    pub fn close(&mut self) {
        self.release();
    }

    fn session(&self) -> Result<&NativeSession<B>, MediaExtError> {
        match &self.state {
            RetrieverState::Live(session) => Ok(session),
            RetrieverState::Unset => Err(MediaExtError::DataSourceNotSet),
            RetrieverState::Released => Err(MediaExtError::SessionReleased),
        }
    }
}

impl<B: NativeBackend> Debug for ThumbnailRetriever<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let state = match &self.state {
            RetrieverState::Unset => "unset",
            RetrieverState::Live(_) => "live",
            RetrieverState::Released => "released",
        };
        f.debug_struct("ThumbnailRetriever")
            .field("options", &self.options)
            .field("state", &state)
            .finish()
    }
}
