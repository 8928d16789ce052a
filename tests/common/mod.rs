//! Shared test helpers: a scripted in-memory backend.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use mediaext::{
    AudioStream, Chapter, Disposition, FrameOptions, MediaInfoSink, MediaSource, NativeBackend,
    NativeHandle, PixelBuffer, SubtitleStream, VideoStream,
};

/// Source width reported by [`MockBackend`] frames.
pub const MOCK_WIDTH: u32 = 64;
/// Source height reported by [`MockBackend`] frames.
pub const MOCK_HEIGHT: u32 = 36;

/// One callback replayed by [`MockBackend::parse`].
#[derive(Debug, Clone)]
pub enum ParseEvent {
    Error,
    MediaInfo(String, Duration),
    Video(VideoStream),
    Audio(AudioStream),
    Subtitle(SubtitleStream),
    Chapter(Chapter),
}

/// Backend that records every create/release and replays a fixed script.
#[derive(Default)]
pub struct MockBackend {
    pub fail_create: Cell<bool>,
    pub created: RefCell<Vec<(NativeHandle, MediaSource)>>,
    pub released: RefCell<Vec<NativeHandle>>,
    pub script: RefCell<Vec<ParseEvent>>,
    pub picture: RefCell<Option<Vec<u8>>>,
    pub rotation: Cell<u32>,
    pub frame_count: Cell<u64>,
    pub queries: Cell<usize>,
    pub last_time: Cell<Option<Duration>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose sources decode `frames` frames.
    pub fn with_frames(frames: u64) -> Self {
        let backend = Self::new();
        backend.frame_count.set(frames);
        backend
    }

    /// A backend whose parse replays `events`.
    pub fn with_script(events: Vec<ParseEvent>) -> Self {
        let backend = Self::new();
        *backend.script.borrow_mut() = events;
        backend
    }

    pub fn release_count(&self, handle: NativeHandle) -> usize {
        self.released
            .borrow()
            .iter()
            .filter(|released| **released == handle)
            .count()
    }

    pub fn live_count(&self) -> usize {
        self.created.borrow().len() - self.released.borrow().len()
    }

    fn check_live(&self, handle: NativeHandle) {
        assert!(!handle.is_null(), "query with null handle");
        assert!(
            !self.released.borrow().contains(&handle),
            "query with released {handle}"
        );
        self.queries.set(self.queries.get() + 1);
    }

    fn frame(&self, shade: u8, options: &FrameOptions) -> RgbaImage {
        let (width, height) = options.resolve_dimensions(MOCK_WIDTH, MOCK_HEIGHT);
        RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255]))
    }
}

impl NativeBackend for MockBackend {
    fn create(&self, source: &MediaSource) -> NativeHandle {
        if self.fail_create.get() {
            return NativeHandle::NULL;
        }
        let handle = NativeHandle::allocate();
        self.created.borrow_mut().push((handle, source.clone()));
        handle
    }

    fn release(&self, handle: NativeHandle) {
        assert!(!handle.is_null(), "release of null handle");
        self.released.borrow_mut().push(handle);
    }

    fn embedded_picture(&self, handle: NativeHandle) -> Option<Vec<u8>> {
        self.check_live(handle);
        self.picture.borrow().clone()
    }

    fn frame_at_time(
        &self,
        handle: NativeHandle,
        time: Option<Duration>,
        options: &FrameOptions,
    ) -> Option<RgbaImage> {
        self.check_live(handle);
        self.last_time.set(time);
        (self.frame_count.get() > 0).then(|| self.frame(128, options))
    }

    fn frame_at_index(
        &self,
        handle: NativeHandle,
        index: u64,
        options: &FrameOptions,
    ) -> Option<RgbaImage> {
        self.check_live(handle);
        (index < self.frame_count.get()).then(|| self.frame(index as u8, options))
    }

    fn load_frame_into(
        &self,
        handle: NativeHandle,
        buffer: &mut PixelBuffer,
        time: Option<Duration>,
    ) -> bool {
        self.check_live(handle);
        self.last_time.set(time);
        if self.frame_count.get() == 0 {
            return false;
        }
        buffer.as_bytes_mut().fill(0xFF);
        true
    }

    fn rotation_degrees(&self, handle: NativeHandle) -> u32 {
        self.check_live(handle);
        self.rotation.get()
    }

    fn parse(&self, _source: &MediaSource, sink: &mut dyn MediaInfoSink) {
        for event in self.script.borrow().iter().cloned() {
            match event {
                ParseEvent::Error => sink.on_error(),
                ParseEvent::MediaInfo(format, duration) => sink.on_media_info_found(format, duration),
                ParseEvent::Video(stream) => sink.on_video_stream_found(stream),
                ParseEvent::Audio(stream) => sink.on_audio_stream_found(stream),
                ParseEvent::Subtitle(stream) => sink.on_subtitle_stream_found(stream),
                ParseEvent::Chapter(chapter) => sink.on_chapter_found(chapter),
            }
        }
    }
}

pub fn video_stream(index: usize, codec: &str) -> VideoStream {
    VideoStream {
        index,
        title: None,
        codec_name: codec.to_string(),
        language: None,
        disposition: Disposition::DEFAULT,
        bit_rate: 1_500_000,
        frame_rate: 23.976,
        frame_width: 1280,
        frame_height: 720,
    }
}

pub fn audio_stream(index: usize, language: &str) -> AudioStream {
    AudioStream {
        index,
        title: None,
        codec_name: "AAC (Advanced Audio Coding)".to_string(),
        language: Some(language.to_string()),
        disposition: Disposition::default(),
        bit_rate: 128_000,
        sample_format: Some("fltp".to_string()),
        sample_rate: 48_000,
        channels: 2,
        channel_layout: Some("stereo".to_string()),
    }
}

pub fn subtitle_stream(index: usize, language: &str) -> SubtitleStream {
    SubtitleStream {
        index,
        title: Some(format!("{language} subtitles")),
        codec_name: "SubRip subtitle".to_string(),
        language: Some(language.to_string()),
        disposition: Disposition::FORCED,
    }
}

pub fn media_info(format: &str, millis: u64) -> ParseEvent {
    ParseEvent::MediaInfo(format.to_string(), Duration::from_millis(millis))
}
