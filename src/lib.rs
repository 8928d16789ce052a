//! # mediaext
//!
//! Media inspection sessions and renderer plumbing for playback hosts,
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! `mediaext` opens a media source once, keeps the native decoder state
//! behind an opaque handle, and answers metadata and still-frame queries
//! against it. Every native handle has exactly one owner and is released
//! exactly once, on explicit release or on drop.
//!
//! ## Quick Start
//!
//! ### Read Metadata
//!
//! ```no_run
//! use mediaext::MediaInfoBuilder;
//!
//! if let Some(info) = MediaInfoBuilder::new().parse_path("input.mkv").build() {
//!     println!("{} lasting {:?}", info.format(), info.duration());
//!     if let Some(video) = info.video_stream() {
//!         println!("{}x{} {}", video.frame_width, video.frame_height, video.codec_name);
//!     }
//! }
//! ```
//!
//! ### Grab a Thumbnail
//!
//! ```no_run
//! use mediaext::{FrameOptions, MediaSource, ThumbnailRetriever};
//!
//! let mut retriever = ThumbnailRetriever::new()
//!     .with_options(FrameOptions::new().with_resolution(Some(320), None).with_rotation(true));
//! retriever.set_data_source(&MediaSource::path("input.mp4"))?;
//! if let Some(frame) = retriever.frame_at_time(None)? {
//!     frame.save("thumbnail.png")?;
//! }
//! # Ok::<(), mediaext::MediaExtError>(())
//! ```
//!
//! ### Delay Subtitles
//!
//! ```
//! use std::sync::mpsc;
//!
//! use mediaext::{Cue, ExtensionRendererMode, Renderer, RendererRegistrar};
//!
//! let registrar = RendererRegistrar::new(ExtensionRendererMode::On).with_subtitle_offset_ms(500);
//! let (sender, receiver) = mpsc::channel::<Vec<Cue>>();
//! let mut renderers: Vec<Box<dyn Renderer>> = Vec::new();
//! registrar.build_text_renderers(
//!     &mut renderers,
//!     vec![Cue::new(1_000_000, 2_000_000, "Hello")],
//!     Box::new(sender),
//! );
//!
//! renderers[0].render(1_600_000, 0);
//! assert_eq!(receiver.recv().unwrap()[0].text, "Hello");
//! ```
//!
//! ## Features
//!
//! - **Metadata**: container format and duration, video/audio/subtitle
//!   stream details, chapters, JSON export
//! - **Thumbnails**: embedded cover art, frames by time or index, display
//!   rotation
//! - **Frame loading**: decode into a reusable caller-owned RGBA buffer
//! - **Time sync**: per-renderer offset and speed remapping
//! - **Renderer registration**: place extension renderers by mode
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod backend;
pub mod builder;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod ffmpeg_backend;
pub mod frame_loader;
pub mod handle;
pub mod metadata;
pub mod pixel;
pub mod registrar;
pub mod renderer;
pub mod session;
pub mod source;
pub mod subtitle;
pub mod thumbnail;
pub mod time_sync;
mod utilities;

pub use backend::{MediaInfoSink, NativeBackend};
pub use builder::{BuildState, MediaInfoBuilder};
pub use configuration::{FrameOptions, ScalingQuality};
pub use error::{BoxError, MediaExtError};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use ffmpeg_backend::FfmpegBackend;
pub use frame_loader::FrameLoader;
pub use handle::NativeHandle;
pub use metadata::{AudioStream, Chapter, Disposition, MediaInfo, SubtitleStream, VideoStream};
pub use pixel::PixelBuffer;
pub use registrar::{ExtensionRenderer, ExtensionRendererMode, RendererRegistrar};
pub use renderer::{
    Renderer, TimeSyncedRenderer, TrackType, find_time_sync, find_time_sync_mut,
    set_subtitle_delay_ms, set_subtitle_speed, subtitle_delay_ms, subtitle_speed,
};
pub use session::NativeSession;
pub use source::MediaSource;
pub use subtitle::{Cue, SubtitleRenderer, TextOutput};
pub use thumbnail::ThumbnailRetriever;
pub use time_sync::{MAX_SPEED, MIN_SPEED, TimeSync};
