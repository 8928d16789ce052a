//! FFmpeg implementation of the native handle protocol.
//!
//! Each live handle maps to an [`InspectionContext`]: an open demuxer plus
//! the facts about its video stream that every query needs (which stream to
//! decode, its display rotation, the container duration). Each context has
//! its own lock, so independent sessions can decode concurrently from
//! different threads.
//!
//! Every FFmpeg failure is logged and translated here. Nothing above this
//! module ever sees an FFmpeg error code.

use std::collections::HashMap;
use std::ffi::{CStr, c_char};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};
use std::time::Duration;

use ffmpeg_next::{
    codec::{self, context::Context as CodecContext},
    decoder,
    format::{Pixel, Sample, context::Input, stream::Stream},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::{self as sys, AVPacketSideDataType, AVSampleFormat};
use image::RgbaImage;

use crate::backend::{MediaInfoSink, NativeBackend};
use crate::configuration::FrameOptions;
use crate::handle::NativeHandle;
use crate::metadata::{AudioStream, Chapter, Disposition, SubtitleStream, VideoStream};
use crate::pixel::PixelBuffer;
use crate::source::MediaSource;
use crate::utilities;

static FFMPEG_INIT: Once = Once::new();

fn ensure_initialized() {
    FFMPEG_INIT.call_once(|| {
        if let Err(error) = ffmpeg_next::init() {
            log::warn!("FFmpeg initialisation failed: {error}");
        }
    });
}

/// Native state behind one handle.
struct InspectionContext {
    input: Input,
    /// Stream decoded for frames. The first video stream that is not cover
    /// art, else FFmpeg's best video stream.
    video_stream_index: Option<usize>,
    rotation_degrees: u32,
    duration_us: i64,
}

/// Live contexts keyed by handle.
///
/// The map lock is only held to look up, add or remove an entry. Each entry
/// carries its own lock, so a long decode on one handle never blocks
/// lookups, creates or releases on others.
struct HandleTable<T> {
    entries: Mutex<HashMap<NativeHandle, Arc<Mutex<T>>>>,
}

impl<T> HandleTable<T> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<NativeHandle, Arc<Mutex<T>>>> {
        // Entries are only ever inserted or removed whole, so a poisoned map
        // is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, handle: NativeHandle, value: T) {
        self.entries().insert(handle, Arc::new(Mutex::new(value)));
    }

    /// Drop the table's reference. A query still running on the entry keeps
    /// it alive until it returns.
    fn remove(&self, handle: NativeHandle) -> bool {
        self.entries().remove(&handle).is_some()
    }

    fn get(&self, handle: NativeHandle) -> Option<Arc<Mutex<T>>> {
        self.entries().get(&handle).cloned()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// The production [`NativeBackend`], built on `ffmpeg-next`.
///
/// Cheap to construct. Share one instance through an `Arc` between the
/// sessions that use it.
pub struct FfmpegBackend {
    contexts: HandleTable<InspectionContext>,
}

impl FfmpegBackend {
    /// Create a backend with an empty handle table.
    pub fn new() -> Self {
        ensure_initialized();
        Self {
            contexts: HandleTable::new(),
        }
    }

    /// Number of handles currently live.
    pub fn live_handles(&self) -> usize {
        self.contexts.len()
    }

    fn with_context<T>(
        &self,
        handle: NativeHandle,
        fallback: T,
        query: impl FnOnce(&mut InspectionContext) -> T,
    ) -> T {
        let Some(entry) = self.contexts.get(handle) else {
            log::warn!("Query against unknown {handle}");
            return fallback;
        };
        let mut context = entry.lock().unwrap_or_else(PoisonError::into_inner);
        query(&mut *context)
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FfmpegBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegBackend")
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

impl NativeBackend for FfmpegBackend {
    fn create(&self, source: &MediaSource) -> NativeHandle {
        let input = match open_input(source) {
            Some(input) => input,
            None => return NativeHandle::NULL,
        };

        let video_stream_index = select_video_stream(&input);
        let rotation_degrees = video_stream_index
            .and_then(|index| input.stream(index))
            .map(|stream| read_rotation_degrees(&stream))
            .unwrap_or(0);
        let duration_us = input.duration();

        let handle = NativeHandle::allocate();
        self.contexts.insert(
            handle,
            InspectionContext {
                input,
                video_stream_index,
                rotation_degrees,
                duration_us,
            },
        );
        handle
    }

    fn release(&self, handle: NativeHandle) {
        if !self.contexts.remove(handle) {
            log::warn!("Release of unknown {handle}");
        }
    }

    fn embedded_picture(&self, handle: NativeHandle) -> Option<Vec<u8>> {
        self.with_context(handle, None, |context| {
            context.input.streams().find_map(|stream| attached_picture(&stream))
        })
    }

    fn frame_at_time(
        &self,
        handle: NativeHandle,
        time: Option<Duration>,
        options: &FrameOptions,
    ) -> Option<RgbaImage> {
        self.with_context(handle, None, |context| {
            let target_us = seek_target_us(context.duration_us, time);
            let frame = decode_frame_near(context, target_us)?;
            convert_for_options(&frame, context.rotation_degrees, options)
        })
    }

    fn frame_at_index(
        &self,
        handle: NativeHandle,
        index: u64,
        options: &FrameOptions,
    ) -> Option<RgbaImage> {
        self.with_context(handle, None, |context| {
            let frame = decode_frame_at_index(context, index)?;
            convert_for_options(&frame, context.rotation_degrees, options)
        })
    }

    fn load_frame_into(
        &self,
        handle: NativeHandle,
        buffer: &mut PixelBuffer,
        time: Option<Duration>,
    ) -> bool {
        self.with_context(handle, false, |context| {
            let target_us = seek_target_us(context.duration_us, time);
            let Some(frame) = decode_frame_near(context, target_us) else {
                return false;
            };

            let rotation = context.rotation_degrees;
            let (width, height) = if utilities::swaps_dimensions(rotation) {
                (buffer.height(), buffer.width())
            } else {
                (buffer.width(), buffer.height())
            };
            match scale_to_rgba(&frame, width, height, ScalingFlags::BICUBIC) {
                Some(image) => {
                    buffer.copy_from_image(&utilities::rotate_clockwise(image, rotation))
                }
                None => false,
            }
        })
    }

    fn rotation_degrees(&self, handle: NativeHandle) -> u32 {
        self.with_context(handle, 0, |context| context.rotation_degrees)
    }

    fn parse(&self, source: &MediaSource, sink: &mut dyn MediaInfoSink) {
        let Some(input) = open_input(source) else {
            sink.on_error();
            return;
        };

        sink.on_media_info_found(
            input.format().description().to_string(),
            utilities::micros_to_duration(input.duration()),
        );

        for stream in input.streams() {
            match stream.parameters().medium() {
                Type::Video => sink.on_video_stream_found(video_stream_info(&stream)),
                Type::Audio => sink.on_audio_stream_found(audio_stream_info(&stream)),
                Type::Subtitle => sink.on_subtitle_stream_found(subtitle_stream_info(&stream)),
                _ => {}
            }
        }

        for (index, chapter) in input.chapters().enumerate() {
            let time_base = chapter.time_base();
            sink.on_chapter_found(Chapter {
                index,
                id: i64::from(chapter.id()),
                title: chapter.metadata().get("title").map(str::to_string),
                start: utilities::timestamp_to_duration(
                    chapter.start(),
                    time_base.numerator(),
                    time_base.denominator(),
                ),
                end: utilities::timestamp_to_duration(
                    chapter.end(),
                    time_base.numerator(),
                    time_base.denominator(),
                ),
            });
        }
    }
}

/// Open and probe `source`. `format::input` runs stream-info discovery.
fn open_input(source: &MediaSource) -> Option<Input> {
    ensure_initialized();
    let target = source.demuxer_target();
    match ffmpeg_next::format::input(&target) {
        Ok(input) => {
            log::debug!("Opened {source} ({})", input.format().name());
            Some(input)
        }
        Err(error) => {
            log::warn!("Could not open {source}: {error}");
            None
        }
    }
}

fn select_video_stream(input: &Input) -> Option<usize> {
    input
        .streams()
        .find(|stream| {
            stream.parameters().medium() == Type::Video
                && !raw_disposition(stream).contains(Disposition::ATTACHED_PIC)
        })
        .or_else(|| input.streams().best(Type::Video))
        .map(|stream| stream.index())
}

fn raw_disposition(stream: &Stream<'_>) -> Disposition {
    // SAFETY: the stream pointer is valid while the borrow of the input lives.
    Disposition(unsafe { (*stream.as_ptr()).disposition })
}

fn attached_picture(stream: &Stream<'_>) -> Option<Vec<u8>> {
    if !raw_disposition(stream).contains(Disposition::ATTACHED_PIC) {
        return None;
    }
    // SAFETY: `attached_pic` is owned by the stream and outlives this borrow.
    let packet = unsafe { &(*stream.as_ptr()).attached_pic };
    if packet.data.is_null() || packet.size <= 0 {
        return None;
    }
    // SAFETY: `data` points at `size` initialised bytes.
    let bytes = unsafe { std::slice::from_raw_parts(packet.data, packet.size as usize) };
    Some(bytes.to_vec())
}

/// Display rotation as a clockwise angle. The display matrix, when present,
/// overrides the legacy `rotate` tag.
fn read_rotation_degrees(stream: &Stream<'_>) -> u32 {
    let mut rotation = stream
        .metadata()
        .get("rotate")
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(utilities::normalize_rotation)
        .unwrap_or(0);

    // SAFETY: codecpar and its side data are owned by the stream.
    unsafe {
        let parameters = (*stream.as_ptr()).codecpar;
        if !parameters.is_null() {
            let side_data = sys::av_packet_side_data_get(
                (*parameters).coded_side_data,
                (*parameters).nb_coded_side_data,
                AVPacketSideDataType::AV_PKT_DATA_DISPLAYMATRIX,
            );
            if !side_data.is_null() && !(*side_data).data.is_null() {
                let theta = sys::av_display_rotation_get((*side_data).data as *const i32);
                if theta.is_finite() {
                    rotation = utilities::normalize_rotation(-theta.round() as i64);
                }
            }
        }
    }

    rotation
}

/// Long codec name from the codec descriptor table, which is available
/// whether or not a decoder for the codec was compiled in.
fn codec_long_name(id: codec::Id) -> String {
    // SAFETY: descriptors are static; a null result or null name is checked.
    let long_name = unsafe {
        let descriptor = sys::avcodec_descriptor_get(id.into());
        if descriptor.is_null() || (*descriptor).long_name.is_null() {
            None
        } else {
            Some(CStr::from_ptr((*descriptor).long_name).to_string_lossy().into_owned())
        }
    };
    long_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.name().to_string())
}

/// Name of a raw `AVSampleFormat` value as stored in codec parameters.
fn sample_format_name(raw_format: i32) -> Option<String> {
    let known = 0..AVSampleFormat::AV_SAMPLE_FMT_NB as i32;
    if !known.contains(&raw_format) {
        return None;
    }
    // SAFETY: `AVSampleFormat` is a C enum with contiguous values and
    // `raw_format` was range-checked above.
    let format = unsafe { std::mem::transmute::<i32, AVSampleFormat>(raw_format) };
    Some(Sample::from(format))
        .filter(|sample| *sample != Sample::None)
        .map(|sample| sample.name().to_string())
}

fn tag(stream: &Stream<'_>, key: &str) -> Option<String> {
    stream.metadata().get(key).map(str::to_string)
}

fn video_stream_info(stream: &Stream<'_>) -> VideoStream {
    // SAFETY: codecpar is owned by the stream; this is a shallow copy.
    let raw = unsafe { *stream.parameters().as_ptr() };

    let frame_rate = stream.avg_frame_rate();
    let frame_rate = if frame_rate.denominator() != 0 {
        frame_rate.numerator() as f64 / frame_rate.denominator() as f64
    } else {
        let rate = stream.rate();
        if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        }
    };

    VideoStream {
        index: stream.index(),
        title: tag(stream, "title"),
        codec_name: codec_long_name(stream.parameters().id()),
        language: tag(stream, "language"),
        disposition: raw_disposition(stream),
        bit_rate: raw.bit_rate,
        frame_rate,
        frame_width: raw.width,
        frame_height: raw.height,
    }
}

fn audio_stream_info(stream: &Stream<'_>) -> AudioStream {
    // SAFETY: codecpar is owned by the stream; this is a shallow copy.
    let raw = unsafe { *stream.parameters().as_ptr() };

    AudioStream {
        index: stream.index(),
        title: tag(stream, "title"),
        codec_name: codec_long_name(stream.parameters().id()),
        language: tag(stream, "language"),
        disposition: raw_disposition(stream),
        bit_rate: raw.bit_rate,
        sample_format: sample_format_name(raw.format),
        sample_rate: raw.sample_rate,
        channels: raw.ch_layout.nb_channels,
        channel_layout: describe_channel_layout(&raw.ch_layout),
    }
}

fn subtitle_stream_info(stream: &Stream<'_>) -> SubtitleStream {
    SubtitleStream {
        index: stream.index(),
        title: tag(stream, "title"),
        codec_name: codec_long_name(stream.parameters().id()),
        language: tag(stream, "language"),
        disposition: raw_disposition(stream),
    }
}

fn describe_channel_layout(layout: &sys::AVChannelLayout) -> Option<String> {
    if layout.nb_channels <= 0 {
        return None;
    }
    let mut buffer = [0 as c_char; 64];
    // SAFETY: the buffer is writable for its full length and FFmpeg always
    // NUL-terminates within `buf_size`.
    let written = unsafe {
        sys::av_channel_layout_describe(layout, buffer.as_mut_ptr(), buffer.len())
    };
    if written <= 0 {
        return None;
    }
    // SAFETY: NUL-terminated by av_channel_layout_describe.
    let text = unsafe { CStr::from_ptr(buffer.as_ptr()) };
    Some(text.to_string_lossy().into_owned())
}

/// Microsecond seek target: one third of the duration when `time` is
/// `None`, otherwise `time` clamped to the duration.
fn seek_target_us(duration_us: i64, time: Option<Duration>) -> i64 {
    let duration_us = duration_us.max(0);
    match time {
        None => duration_us / 3,
        Some(time) if duration_us > 0 => utilities::duration_to_micros(time).min(duration_us),
        Some(time) => utilities::duration_to_micros(time),
    }
}

/// Pulls decoded frames from one video stream of an input.
struct FrameReader<'a> {
    input: &'a mut Input,
    stream_index: usize,
    decoder: decoder::Video,
    eof_sent: bool,
}

impl<'a> FrameReader<'a> {
    fn open(input: &'a mut Input, stream_index: usize) -> Option<Self> {
        let opened = {
            let stream = input.stream(stream_index)?;
            CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
        };
        let decoder = match opened {
            Ok(decoder) => decoder,
            Err(error) => {
                log::warn!("Could not create video decoder for stream {stream_index}: {error}");
                return None;
            }
        };
        Some(Self {
            input,
            stream_index,
            decoder,
            eof_sent: false,
        })
    }

    /// Seek to the keyframe at or before `target_us`.
    fn seek(&mut self, target_us: i64) {
        if let Err(error) = self.input.seek(target_us, ..target_us) {
            log::debug!("Seek to {target_us}us failed: {error}");
        }
        self.decoder.flush();
        self.eof_sent = false;
    }

    fn rewind(&mut self) {
        if let Err(error) = self.input.seek(0, ..i64::MAX) {
            log::debug!("Rewind failed: {error}");
        }
        self.decoder.flush();
        self.eof_sent = false;
    }

    fn next_frame(&mut self) -> Option<VideoFrame> {
        let mut frame = VideoFrame::empty();
        loop {
            if self.decoder.receive_frame(&mut frame).is_ok() {
                return Some(frame);
            }
            if self.eof_sent {
                return None;
            }

            let packet = self
                .input
                .packets()
                .next()
                .map(|(stream, packet)| (stream.index(), packet));
            match packet {
                Some((index, packet)) if index == self.stream_index => {
                    if let Err(error) = self.decoder.send_packet(&packet) {
                        log::warn!("Decoder rejected packet: {error}");
                        return None;
                    }
                }
                Some(_) => {}
                None => {
                    // Drain whatever the decoder still buffers.
                    let _ = self.decoder.send_eof();
                    self.eof_sent = true;
                }
            }
        }
    }
}

/// First frame decoded after seeking to `target_us`, falling back to the
/// first decodable frame of the stream.
fn decode_frame_near(context: &mut InspectionContext, target_us: i64) -> Option<VideoFrame> {
    let stream_index = context.video_stream_index?;
    let mut reader = FrameReader::open(&mut context.input, stream_index)?;

    reader.seek(target_us);
    if let Some(frame) = reader.next_frame() {
        return Some(frame);
    }

    log::debug!("No frame at {target_us}us, falling back to the first frame");
    reader.rewind();
    reader.next_frame()
}

fn decode_frame_at_index(context: &mut InspectionContext, index: u64) -> Option<VideoFrame> {
    let stream_index = context.video_stream_index?;
    let mut reader = FrameReader::open(&mut context.input, stream_index)?;

    reader.rewind();
    let mut decoded = 0u64;
    while let Some(frame) = reader.next_frame() {
        if decoded == index {
            return Some(frame);
        }
        decoded += 1;
    }
    log::debug!("Stream has {decoded} frames, index {index} is out of range");
    None
}

fn scale_to_rgba(
    frame: &VideoFrame,
    width: u32,
    height: u32,
    flags: ScalingFlags,
) -> Option<RgbaImage> {
    if frame.width() == 0 || frame.height() == 0 || width == 0 || height == 0 {
        return None;
    }
    let mut scaler = match ScalingContext::get(
        frame.format(),
        frame.width(),
        frame.height(),
        Pixel::RGBA,
        width,
        height,
        flags,
    ) {
        Ok(scaler) => scaler,
        Err(error) => {
            log::warn!("Could not create scaler: {error}");
            return None;
        }
    };

    let mut rgba_frame = VideoFrame::empty();
    if let Err(error) = scaler.run(frame, &mut rgba_frame) {
        log::warn!("Scaling failed: {error}");
        return None;
    }
    utilities::frame_to_image(&rgba_frame, width, height)
}

fn convert_for_options(
    frame: &VideoFrame,
    rotation: u32,
    options: &FrameOptions,
) -> Option<RgbaImage> {
    let rotation = if options.apply_rotation { rotation } else { 0 };
    let swap = utilities::swaps_dimensions(rotation);

    let (source_width, source_height) = if swap {
        (frame.height(), frame.width())
    } else {
        (frame.width(), frame.height())
    };
    let (width, height) = options.resolve_dimensions(source_width, source_height);
    let (scale_width, scale_height) = if swap { (height, width) } else { (width, height) };

    let flags = options.scaling.to_ffmpeg_flags();
    let image = scale_to_rgba(frame, scale_width, scale_height, flags)?;
    Some(utilities::rotate_clockwise(image, rotation))
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    #[test]
    fn seek_target_defaults_to_a_third() {
        assert_eq!(seek_target_us(9_000_000, None), 3_000_000);
    }

    #[test]
    fn seek_target_clamps_to_duration() {
        assert_eq!(seek_target_us(5_000_000, Some(Duration::from_secs(10))), 5_000_000);
        assert_eq!(seek_target_us(5_000_000, Some(Duration::from_secs(2))), 2_000_000);
    }

    #[test]
    fn seek_target_with_unknown_duration() {
        // AV_NOPTS_VALUE
        assert_eq!(seek_target_us(i64::MIN, None), 0);
        assert_eq!(seek_target_us(0, Some(Duration::from_secs(4))), 4_000_000);
    }

    #[test]
    fn sample_format_from_parameters() {
        let fltp = AVSampleFormat::AV_SAMPLE_FMT_FLTP as i32;
        assert_eq!(sample_format_name(fltp).as_deref(), Some("fltp"));
        assert_eq!(sample_format_name(-1), None);
        assert_eq!(sample_format_name(AVSampleFormat::AV_SAMPLE_FMT_NB as i32), None);
    }

    #[test]
    fn long_codec_names_come_from_descriptors() {
        assert_eq!(codec_long_name(codec::Id::AAC), "AAC (Advanced Audio Coding)");
        assert_eq!(codec_long_name(codec::Id::AC3), "ATSC A/52A (AC-3)");
    }

    #[test]
    fn busy_entry_does_not_block_the_table() {
        let table = Arc::new(HandleTable::new());
        let busy = NativeHandle::allocate();
        let idle = NativeHandle::allocate();
        table.insert(busy, 0u32);
        table.insert(idle, 0u32);

        let entry = table.get(busy).expect("Entry should exist");
        let guard = entry.lock().expect("Failed to lock entry");

        let (done_sender, done_receiver) = mpsc::channel();
        let worker_table = Arc::clone(&table);
        let worker = thread::spawn(move || {
            let before = worker_table.len();
            let removed = worker_table.remove(idle);
            let after = worker_table.len();
            done_sender.send((before, removed, after)).expect("Failed to report");
        });

        let outcome = done_receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("Table operations waited on a busy entry");
        assert_eq!(outcome, (2, true, 1));
        drop(guard);
        worker.join().expect("Worker panicked");
    }

    #[test]
    fn removed_entry_outlives_a_running_query() {
        let table = HandleTable::new();
        let handle = NativeHandle::allocate();
        table.insert(handle, String::from("context"));

        let entry = table.get(handle).expect("Entry should exist");
        assert!(table.remove(handle));
        assert!(!table.remove(handle));
        assert!(table.get(handle).is_none());
        assert_eq!(*entry.lock().expect("Failed to lock entry"), "context");
    }
}
