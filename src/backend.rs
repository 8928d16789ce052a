//! The native handle protocol.
//!
//! [`NativeBackend`] is the boundary between the session wrappers in this
//! crate and the component that actually demuxes and decodes media. The
//! wrappers never look inside native state: they create a handle, pass it
//! back into queries, and release it exactly once.
//!
//! Backends translate every native failure at this boundary. Creation
//! failures come back as [`NativeHandle::NULL`], missing data as `None` or
//! `false`, and metadata parse failures as a call to
//! [`MediaInfoSink::on_error`]. Raw native error codes never escape.
//!
//! [`FfmpegBackend`](crate::FfmpegBackend) is the production implementation.

use std::time::Duration;

use image::RgbaImage;

use crate::configuration::FrameOptions;
use crate::handle::NativeHandle;
use crate::metadata::{AudioStream, Chapter, SubtitleStream, VideoStream};
use crate::pixel::PixelBuffer;
use crate::source::MediaSource;

/// Receiver for the metadata callbacks issued while a source is parsed.
///
/// Callbacks arrive in parser-discovered order, all from within a single
/// [`NativeBackend::parse`] call.
pub trait MediaInfoSink {
    /// The source could not be opened or probed.
    fn on_error(&mut self);

    /// Container-level information.
    fn on_media_info_found(&mut self, format: String, duration: Duration);

    /// A video stream was found.
    fn on_video_stream_found(&mut self, stream: VideoStream);

    /// An audio stream was found.
    fn on_audio_stream_found(&mut self, stream: AudioStream);

    /// A subtitle stream was found.
    fn on_subtitle_stream_found(&mut self, stream: SubtitleStream);

    /// A chapter marker was found.
    fn on_chapter_found(&mut self, _chapter: Chapter) {}
}

/// The handle-based protocol every native decoder implementation provides.
///
/// All calls are blocking and run on the caller's thread. Query methods are
/// only ever invoked with handles that this backend returned from
/// [`create`](NativeBackend::create) and that have not been passed to
/// [`release`](NativeBackend::release); the session wrappers enforce this.
pub trait NativeBackend {
    /// Open and probe `source`, returning a live handle or
    /// [`NativeHandle::NULL`] on failure.
    fn create(&self, source: &MediaSource) -> NativeHandle;

    /// Free the native state behind `handle`.
    fn release(&self, handle: NativeHandle);

    /// Container-embedded cover art bytes, if present. Must not decode video.
    fn embedded_picture(&self, handle: NativeHandle) -> Option<Vec<u8>>;

    /// Decode the frame nearest `time`; `None` selects a representative
    /// frame at one third of the duration.
    fn frame_at_time(
        &self,
        handle: NativeHandle,
        time: Option<Duration>,
        options: &FrameOptions,
    ) -> Option<RgbaImage>;

    /// Decode the `index`-th frame of the video stream, counting from zero.
    fn frame_at_index(
        &self,
        handle: NativeHandle,
        index: u64,
        options: &FrameOptions,
    ) -> Option<RgbaImage>;

    /// Decode one frame into `buffer`, scaled to the buffer's declared size.
    /// Returns `false` if no frame could be decoded.
    fn load_frame_into(
        &self,
        handle: NativeHandle,
        buffer: &mut PixelBuffer,
        time: Option<Duration>,
    ) -> bool;

    /// Display rotation of the video stream in degrees (0, 90, 180 or 270).
    fn rotation_degrees(&self, handle: NativeHandle) -> u32;

    /// Parse `source` once, reporting everything found to `sink`.
    fn parse(&self, source: &MediaSource, sink: &mut dyn MediaInfoSink);
}
