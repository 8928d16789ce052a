//! Decode frames into caller-owned pixel buffers.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::NativeBackend;
use crate::error::MediaExtError;
use crate::ffmpeg_backend::FfmpegBackend;
use crate::pixel::PixelBuffer;
use crate::session::NativeSession;
use crate::source::MediaSource;

/// A long-lived session that decodes single frames into a [`PixelBuffer`].
///
/// Unlike [`ThumbnailRetriever`](crate::ThumbnailRetriever), which returns
/// freshly allocated images, a frame loader writes into a buffer the caller
/// keeps reusing. Frames are always rotated upright and scaled to the
/// buffer's dimensions.
///
/// Usually obtained through
/// [`MediaInfoBuilder::with_frame_loader`](crate::MediaInfoBuilder::with_frame_loader).
pub struct FrameLoader<B: NativeBackend = FfmpegBackend> {
    session: NativeSession<B>,
}

impl<B: NativeBackend> FrameLoader<B> {
    /// Open a frame loader on `source`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::SourceOpen`] if the backend cannot open the
    /// source.
    pub fn open(backend: Arc<B>, source: &MediaSource) -> Result<Self, MediaExtError> {
        let session = NativeSession::create(backend, source)?;
        Ok(Self { session })
    }

    /// Decode the frame at `time` (or a representative frame when `None`)
    /// into `buffer`.
    ///
    /// Returns `Ok(false)` when no frame could be decoded; the buffer
    /// contents are unspecified in that case.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::SessionReleased`] after
    /// [`release`](FrameLoader::release).
    pub fn load_into(
        &mut self,
        buffer: &mut PixelBuffer,
        time: Option<Duration>,
    ) -> Result<bool, MediaExtError> {
        self.session
            .query(|backend, handle| backend.load_frame_into(handle, buffer, time))
    }

    /// Release the underlying session. Later calls are no-ops.
    pub fn release(&mut self) {
        self.session.release();
    }

    /// Returns `true` once [`release`](FrameLoader::release) has been called.
    pub fn is_released(&self) -> bool {
        !self.session.is_live()
    }
}

impl<B: NativeBackend> Debug for FrameLoader<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameLoader")
            .field("session", &self.session)
            .finish()
    }
}
