//! Callback-populated metadata builder.
//!
//! [`MediaInfoBuilder`] is filled in by the backend while it parses a source
//! (see [`MediaInfoSink`]) and then frozen into a [`MediaInfo`] by
//! [`build`](MediaInfoBuilder::build). The parse runs synchronously inside
//! the `parse_*` call, so by the time it returns every callback has fired.
//!
//! Population rules:
//!
//! - [`on_error`](MediaInfoSink::on_error) is sticky: once seen, `build`
//!   returns `None` no matter what else arrives.
//! - [`on_media_info_found`](MediaInfoSink::on_media_info_found) overwrites
//!   earlier values (last write wins).
//! - Only the first [`on_video_stream_found`](MediaInfoSink::on_video_stream_found)
//!   is kept (first wins).
//! - Audio, subtitle and chapter callbacks append in call order.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{MediaInfoSink, NativeBackend};
use crate::ffmpeg_backend::FfmpegBackend;
use crate::frame_loader::FrameLoader;
use crate::metadata::{AudioStream, Chapter, MediaInfo, SubtitleStream, VideoStream};
use crate::source::MediaSource;

/// Observable state of a [`MediaInfoBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// The mandatory container fields have not been reported yet.
    Empty,
    /// Format and duration are known; `build` will succeed.
    Populated,
    /// An error was reported. Terminal.
    Failed,
}

/// One-shot builder for [`MediaInfo`].
///
/// # Example
///
/// ```no_run
/// use mediaext::MediaInfoBuilder;
///
/// let info = MediaInfoBuilder::new()
///     .with_frame_loader(true)
///     .parse_path("input.mp4")
///     .build();
///
/// match info {
///     Some(info) => println!("{:#}", info.to_json()),
///     None => eprintln!("not a readable media file"),
/// }
/// ```
pub struct MediaInfoBuilder<B: NativeBackend = FfmpegBackend> {
    backend: Arc<B>,
    has_error: bool,
    format: Option<String>,
    duration: Option<Duration>,
    video_stream: Option<VideoStream>,
    audio_streams: Vec<AudioStream>,
    subtitle_streams: Vec<SubtitleStream>,
    chapters: Vec<Chapter>,
    want_frame_loader: bool,
    frame_loader: Option<FrameLoader<B>>,
}

impl MediaInfoBuilder<FfmpegBackend> {
    /// Builder backed by a fresh [`FfmpegBackend`].
    pub fn new() -> Self {
        Self::with_backend(Arc::new(FfmpegBackend::new()))
    }
}

impl Default for MediaInfoBuilder<FfmpegBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: NativeBackend> MediaInfoBuilder<B> {
    /// Builder that parses through `backend`.
    pub fn with_backend(backend: Arc<B>) -> Self {
        Self {
            backend,
            has_error: false,
            format: None,
            duration: None,
            video_stream: None,
            audio_streams: Vec::new(),
            subtitle_streams: Vec::new(),
            chapters: Vec::new(),
            want_frame_loader: false,
            frame_loader: None,
        }
    }

    /// Also open a [`FrameLoader`] on the parsed source and embed it in the
    /// resulting [`MediaInfo`]. Failing to open it fails the build.
    #[must_use]
    pub fn with_frame_loader(mut self, enabled: bool) -> Self {
        self.want_frame_loader = enabled;
        self
    }

    /// Parse a filesystem path.
    #[must_use]
    pub fn parse_path<P: AsRef<Path>>(self, path: P) -> Self {
        self.parse_source(&MediaSource::path(path))
    }

    /// Parse an open file descriptor. The caller keeps ownership of it.
    #[cfg(unix)]
    #[must_use]
    pub fn parse_descriptor(self, fd: std::os::fd::BorrowedFd<'_>) -> Self {
        self.parse_source(&MediaSource::descriptor(fd))
    }

    /// Parse a remote URL.
    #[must_use]
    pub fn parse_url(self, url: &str) -> Self {
        self.parse_source(&MediaSource::url(url))
    }

    /// Parse any [`MediaSource`]. Blocks until the native parse completes.
    #[must_use]
    pub fn parse_source(mut self, source: &MediaSource) -> Self {
        log::debug!("Parsing media info from {source}");
        let backend = Arc::clone(&self.backend);
        backend.parse(source, &mut self);

        if self.want_frame_loader && !self.has_error {
            match FrameLoader::open(backend, source) {
                Ok(loader) => self.frame_loader = Some(loader),
                Err(error) => {
                    log::warn!("Could not open frame loader for {source}: {error}");
                    self.on_error();
                }
            }
        }
        self
    }

    /// Current population state.
    pub fn state(&self) -> BuildState {
        if self.has_error {
            BuildState::Failed
        } else if self.format.is_some() && self.duration.is_some() {
            BuildState::Populated
        } else {
            BuildState::Empty
        }
    }

    /// Freeze the collected data.
    ///
    /// Returns `None` if an error was reported or if the container format and
    /// duration were never reported.
    pub fn build(self) -> Option<MediaInfo<B>> {
        if self.state() != BuildState::Populated {
            log::debug!("MediaInfo build failed in state {:?}", self.state());
            return None;
        }

        let format = self.format?;
        let duration = self.duration?;
        let chapters = if self.chapters.is_empty() {
            None
        } else {
            Some(self.chapters)
        };

        log::info!(
            "Built media info (format={}, duration={:.3}s, video={}, audio_streams={}, subtitle_streams={})",
            format,
            duration.as_secs_f64(),
            self.video_stream.is_some(),
            self.audio_streams.len(),
            self.subtitle_streams.len(),
        );

        Some(MediaInfo {
            format,
            duration,
            video_stream: self.video_stream,
            audio_streams: self.audio_streams,
            subtitle_streams: self.subtitle_streams,
            chapters,
            frame_loader: self.frame_loader,
        })
    }
}

impl<B: NativeBackend> MediaInfoSink for MediaInfoBuilder<B> {
    fn on_error(&mut self) {
        self.has_error = true;
    }

    fn on_media_info_found(&mut self, format: String, duration: Duration) {
        self.format = Some(format);
        self.duration = Some(duration);
    }

    fn on_video_stream_found(&mut self, stream: VideoStream) {
        if self.video_stream.is_none() {
            self.video_stream = Some(stream);
        } else {
            log::debug!("Ignoring additional video stream #{}", stream.index);
        }
    }

    fn on_audio_stream_found(&mut self, stream: AudioStream) {
        self.audio_streams.push(stream);
    }

    fn on_subtitle_stream_found(&mut self, stream: SubtitleStream) {
        self.subtitle_streams.push(stream);
    }

    fn on_chapter_found(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }
}
