//! Media metadata types.
//!
//! [`MediaInfo`] is the immutable snapshot produced by
//! [`MediaInfoBuilder::build`](crate::MediaInfoBuilder::build). The stream
//! records it holds are plain values keyed by the container's own stream
//! index, which is not necessarily contiguous or zero-based.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use serde_json::{Value, json};

use crate::backend::NativeBackend;
use crate::ffmpeg_backend::FfmpegBackend;
use crate::frame_loader::FrameLoader;

/// Stream disposition bit flags, as reported by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Disposition(pub i32);

impl Disposition {
    /// The stream is the default choice for its type.
    pub const DEFAULT: Disposition = Disposition(0x0001);
    /// Dubbed audio.
    pub const DUB: Disposition = Disposition(0x0002);
    /// Original-language track.
    pub const ORIGINAL: Disposition = Disposition(0x0004);
    /// Commentary track.
    pub const COMMENT: Disposition = Disposition(0x0008);
    /// Subtitles that must always be shown.
    pub const FORCED: Disposition = Disposition(0x0040);
    /// For the hearing impaired.
    pub const HEARING_IMPAIRED: Disposition = Disposition(0x0080);
    /// For the visually impaired.
    pub const VISUAL_IMPAIRED: Disposition = Disposition(0x0100);
    /// The stream is a single embedded picture (cover art).
    pub const ATTACHED_PIC: Disposition = Disposition(0x0400);

    /// Raw flag bits.
    pub fn bits(self) -> i32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    pub fn contains(self, other: Disposition) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Metadata for a video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStream {
    /// Container stream index.
    pub index: usize,
    /// Stream title tag, if present.
    pub title: Option<String>,
    /// Descriptive codec name (e.g. `"H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10"`).
    pub codec_name: String,
    /// Language tag, if present.
    pub language: Option<String>,
    /// Disposition flags.
    pub disposition: Disposition,
    /// Bit rate in bits per second, `0` when unknown.
    pub bit_rate: i64,
    /// Frames per second, `0.0` when unknown.
    pub frame_rate: f64,
    /// Coded frame width in pixels.
    pub frame_width: i32,
    /// Coded frame height in pixels.
    pub frame_height: i32,
}

/// Metadata for an audio stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStream {
    /// Container stream index.
    pub index: usize,
    /// Stream title tag, if present.
    pub title: Option<String>,
    /// Descriptive codec name.
    pub codec_name: String,
    /// Language tag, if present.
    pub language: Option<String>,
    /// Disposition flags.
    pub disposition: Disposition,
    /// Bit rate in bits per second, `0` when unknown.
    pub bit_rate: i64,
    /// Sample format name (e.g. `"fltp"`), if known.
    pub sample_format: Option<String>,
    /// Sample rate in hertz.
    pub sample_rate: i32,
    /// Number of channels.
    pub channels: i32,
    /// Channel layout description (e.g. `"stereo"`, `"5.1(side)"`), if known.
    pub channel_layout: Option<String>,
}

/// Metadata for a subtitle stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStream {
    /// Container stream index.
    pub index: usize,
    /// Stream title tag, if present.
    pub title: Option<String>,
    /// Descriptive codec name.
    pub codec_name: String,
    /// Language tag, if present.
    pub language: Option<String>,
    /// Disposition flags.
    pub disposition: Disposition,
}

/// A chapter marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// Zero-based position in the container's chapter list.
    pub index: usize,
    /// Container-assigned chapter id.
    pub id: i64,
    /// Chapter title tag, if present.
    pub title: Option<String>,
    /// Chapter start time.
    pub start: Duration,
    /// Chapter end time.
    pub end: Duration,
}

/// Immutable metadata snapshot for one media source.
///
/// The only mutation allowed after construction is releasing the embedded
/// [`FrameLoader`], if one was requested from the builder.
///
/// # Example
///
/// ```no_run
/// use mediaext::MediaInfoBuilder;
///
/// let info = MediaInfoBuilder::new().parse_path("input.mkv").build();
/// if let Some(info) = info {
///     println!("{} ({:?})", info.format(), info.duration());
///     for audio in info.audio_streams() {
///         println!("audio #{}: {}", audio.index, audio.codec_name);
///     }
/// }
/// ```
pub struct MediaInfo<B: NativeBackend = FfmpegBackend> {
    pub(crate) format: String,
    pub(crate) duration: Duration,
    pub(crate) video_stream: Option<VideoStream>,
    pub(crate) audio_streams: Vec<AudioStream>,
    pub(crate) subtitle_streams: Vec<SubtitleStream>,
    pub(crate) chapters: Option<Vec<Chapter>>,
    pub(crate) frame_loader: Option<FrameLoader<B>>,
}

impl<B: NativeBackend> Debug for MediaInfo<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaInfo")
            .field("format", &self.format)
            .field("duration", &self.duration)
            .field("video_stream", &self.video_stream)
            .field("audio_streams", &self.audio_streams)
            .field("subtitle_streams", &self.subtitle_streams)
            .field("chapters", &self.chapters)
            .field("has_frame_loader", &self.frame_loader.is_some())
            .finish()
    }
}

impl<B: NativeBackend> MediaInfo<B> {
    /// Container format long name (e.g. `"Matroska / WebM"`).
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Total container duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The first video stream reported by the parser, if any.
    pub fn video_stream(&self) -> Option<&VideoStream> {
        self.video_stream.as_ref()
    }

    /// Audio streams in container order.
    pub fn audio_streams(&self) -> &[AudioStream] {
        &self.audio_streams
    }

    /// Subtitle streams in container order.
    pub fn subtitle_streams(&self) -> &[SubtitleStream] {
        &self.subtitle_streams
    }

    /// Chapters in container order, or `None` if the container has none.
    pub fn chapters(&self) -> Option<&[Chapter]> {
        self.chapters.as_deref()
    }

    /// The embedded frame loader, if one was requested and is still live.
    pub fn frame_loader(&mut self) -> Option<&mut FrameLoader<B>> {
        self.frame_loader
            .as_mut()
            .filter(|loader| !loader.is_released())
    }

    /// Release the embedded frame loader. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(loader) = self.frame_loader.as_mut() {
            loader.release();
        }
    }

    /// Render the snapshot as JSON for diagnostics.
    pub fn to_json(&self) -> Value {
        json!({
            "format": self.format,
            "duration_ms": self.duration.as_millis() as u64,
            "video": self.video_stream.as_ref().map(|video| json!({
                "index": video.index,
                "title": video.title,
                "codec": video.codec_name,
                "language": video.language,
                "disposition": video.disposition.bits(),
                "bit_rate": video.bit_rate,
                "frame_rate": video.frame_rate,
                "width": video.frame_width,
                "height": video.frame_height,
            })),
            "audio": self.audio_streams.iter().map(|audio| json!({
                "index": audio.index,
                "title": audio.title,
                "codec": audio.codec_name,
                "language": audio.language,
                "disposition": audio.disposition.bits(),
                "bit_rate": audio.bit_rate,
                "sample_format": audio.sample_format,
                "sample_rate": audio.sample_rate,
                "channels": audio.channels,
                "channel_layout": audio.channel_layout,
            })).collect::<Vec<_>>(),
            "subtitles": self.subtitle_streams.iter().map(|subtitle| json!({
                "index": subtitle.index,
                "title": subtitle.title,
                "codec": subtitle.codec_name,
                "language": subtitle.language,
                "disposition": subtitle.disposition.bits(),
            })).collect::<Vec<_>>(),
            "chapters": self.chapters.as_ref().map(|chapters| chapters.iter().map(|chapter| json!({
                "index": chapter.index,
                "id": chapter.id,
                "title": chapter.title,
                "start_ms": chapter.start.as_millis() as u64,
                "end_ms": chapter.end.as_millis() as u64,
            })).collect::<Vec<_>>()),
        })
    }
}
