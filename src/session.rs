//! Native session lifecycle.
//!
//! A [`NativeSession`] is the single owner of one live [`NativeHandle`]. It
//! cannot be cloned, only moved, and it releases its handle when dropped, so
//! every exit path (including early returns and panics unwinding through the
//! owner) frees the native state exactly once.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::backend::NativeBackend;
use crate::error::MediaExtError;
use crate::ffmpeg_backend::FfmpegBackend;
use crate::handle::NativeHandle;
use crate::source::MediaSource;

/// Owner of one native handle.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use mediaext::{FfmpegBackend, MediaSource, NativeSession};
///
/// let backend = Arc::new(FfmpegBackend::new());
/// let mut session = NativeSession::create(backend, &MediaSource::path("input.mp4"))?;
/// assert!(session.is_live());
/// session.release();
/// session.release(); // no-op
/// assert!(session.handle().is_err());
/// # Ok::<(), mediaext::MediaExtError>(())
/// ```
pub struct NativeSession<B: NativeBackend = FfmpegBackend> {
    backend: Arc<B>,
    handle: NativeHandle,
}

impl<B: NativeBackend> NativeSession<B> {
    /// Create a session against `source`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::SourceOpen`] if the backend hands back a null
    /// handle. Nothing is retried.
    pub fn create(backend: Arc<B>, source: &MediaSource) -> Result<Self, MediaExtError> {
        let handle = backend.create(source);
        if handle.is_null() {
            log::warn!("Native layer could not open {source}");
            return Err(MediaExtError::SourceOpen {
                source_description: source.to_string(),
                reason: "native layer returned a null handle".to_string(),
            });
        }

        log::debug!("Created native session {handle} for {source}");
        Ok(Self { backend, handle })
    }

    /// The live handle.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::SessionReleased`] once the session has been
    /// released.
    pub fn handle(&self) -> Result<NativeHandle, MediaExtError> {
        if self.handle.is_null() {
            return Err(MediaExtError::SessionReleased);
        }
        Ok(self.handle)
    }

    /// Run `query` against the live handle.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::SessionReleased`] without calling `query`
    /// if the session was released.
    pub fn query<T, F>(&self, query: F) -> Result<T, MediaExtError>
    where
        F: FnOnce(&B, NativeHandle) -> T,
    {
        let handle = self.handle()?;
        Ok(query(&self.backend, handle))
    }

    /// Returns `true` until [`release`](NativeSession::release) is called.
    pub fn is_live(&self) -> bool {
        !self.handle.is_null()
    }

    /// Release the native state. Later calls are no-ops.
    pub fn release(&mut self) {
        // Reset to the sentinel before delegating so a second call, or a
        // panic inside the backend, can never release the same value twice.
        let handle = std::mem::replace(&mut self.handle, NativeHandle::NULL);
        if handle.is_null() {
            return;
        }
        log::debug!("Releasing native session {handle}");
        self.backend.release(handle);
    }

    /// The backend this session talks to.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

impl<B: NativeBackend> Drop for NativeSession<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: NativeBackend> Debug for NativeSession<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("NativeSession")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
