//! Metadata builder tests driven by scripted parse callbacks.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockBackend, ParseEvent, audio_stream, media_info, subtitle_stream, video_stream};
use mediaext::{
    BuildState, Chapter, MediaInfoBuilder, MediaInfoSink, MediaSource, PixelBuffer,
};

fn builder(events: Vec<ParseEvent>) -> (Arc<MockBackend>, MediaInfoBuilder<MockBackend>) {
    let backend = Arc::new(MockBackend::with_script(events));
    let builder = MediaInfoBuilder::with_backend(Arc::clone(&backend));
    (backend, builder)
}

#[test]
fn full_parse_builds_snapshot() {
    let (_backend, builder) = builder(vec![
        media_info("Matroska / WebM", 90_500),
        ParseEvent::Video(video_stream(0, "H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10")),
        ParseEvent::Audio(audio_stream(1, "eng")),
        ParseEvent::Audio(audio_stream(2, "jpn")),
        ParseEvent::Subtitle(subtitle_stream(3, "eng")),
    ]);

    let info = builder
        .parse_path("movie.mkv")
        .build()
        .expect("Build should succeed");

    assert_eq!(info.format(), "Matroska / WebM");
    assert_eq!(info.duration(), Duration::from_millis(90_500));
    assert_eq!(info.video_stream().map(|video| video.index), Some(0));

    let languages: Vec<_> = info
        .audio_streams()
        .iter()
        .map(|audio| audio.language.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(languages, ["eng", "jpn"]);
    assert_eq!(info.subtitle_streams().len(), 1);
    assert!(info.chapters().is_none());
}

#[test]
fn error_makes_build_fail() {
    let (_backend, builder) = builder(vec![
        media_info("QuickTime / MOV", 1000),
        ParseEvent::Error,
    ]);
    let builder = builder.parse_path("broken.mp4");
    assert_eq!(builder.state(), BuildState::Failed);
    assert!(builder.build().is_none());
}

#[test]
fn error_is_sticky() {
    let (_backend, builder) = builder(vec![
        ParseEvent::Error,
        media_info("QuickTime / MOV", 1000),
        ParseEvent::Video(video_stream(0, "HEVC")),
    ]);
    let builder = builder.parse_path("broken.mp4");
    assert_eq!(builder.state(), BuildState::Failed);
    assert!(builder.build().is_none());
}

#[test]
fn missing_media_info_fails() {
    let (_backend, builder) = builder(vec![
        ParseEvent::Video(video_stream(0, "VP9")),
        ParseEvent::Audio(audio_stream(1, "eng")),
    ]);
    let builder = builder.parse_url("https://example.com/stream.webm");
    assert_eq!(builder.state(), BuildState::Empty);
    assert!(builder.build().is_none());
}

#[test]
fn empty_parse_fails() {
    let (_backend, builder) = builder(Vec::new());
    assert_eq!(builder.state(), BuildState::Empty);
    assert!(builder.parse_path("empty.mp4").build().is_none());
}

#[test]
fn first_video_stream_wins() {
    let (_backend, builder) = builder(vec![
        media_info("Matroska / WebM", 1000),
        ParseEvent::Video(video_stream(0, "H.264")),
        ParseEvent::Video(video_stream(4, "Motion JPEG")),
    ]);
    let info = builder.parse_path("a.mkv").build().expect("Build should succeed");
    let video = info.video_stream().expect("Video stream should be present");
    assert_eq!(video.index, 0);
    assert_eq!(video.codec_name, "H.264");
}

#[test]
fn last_media_info_wins() {
    let (_backend, builder) = builder(vec![
        media_info("first", 1000),
        media_info("second", 2000),
    ]);
    let info = builder.parse_path("a.mkv").build().expect("Build should succeed");
    assert_eq!(info.format(), "second");
    assert_eq!(info.duration(), Duration::from_secs(2));
}

#[test]
fn media_info_alone_is_enough() {
    let (_backend, builder) = builder(vec![media_info("WAV / WAVE (Waveform Audio)", 0)]);
    let info = builder.parse_path("silence.wav").build().expect("Build should succeed");
    assert!(info.video_stream().is_none());
    assert!(info.audio_streams().is_empty());
    assert!(info.subtitle_streams().is_empty());
    assert_eq!(info.duration(), Duration::ZERO);
}

#[test]
fn state_tracks_callbacks() {
    let (_backend, mut builder) = builder(Vec::new());
    assert_eq!(builder.state(), BuildState::Empty);

    builder.on_audio_stream_found(audio_stream(0, "eng"));
    assert_eq!(builder.state(), BuildState::Empty);

    builder.on_media_info_found("MP3 (MPEG audio layer 3)".to_string(), Duration::from_secs(3));
    assert_eq!(builder.state(), BuildState::Populated);

    builder.on_error();
    assert_eq!(builder.state(), BuildState::Failed);

    builder.on_media_info_found("MP3 (MPEG audio layer 3)".to_string(), Duration::from_secs(3));
    assert_eq!(builder.state(), BuildState::Failed);
}

#[test]
fn chapters_are_collected_in_order() {
    let chapter = |index: usize, start: u64, end: u64| Chapter {
        index,
        id: index as i64 + 100,
        title: Some(format!("Chapter {}", index + 1)),
        start: Duration::from_secs(start),
        end: Duration::from_secs(end),
    };
    let (_backend, builder) = builder(vec![
        media_info("Matroska / WebM", 120_000),
        ParseEvent::Chapter(chapter(0, 0, 60)),
        ParseEvent::Chapter(chapter(1, 60, 120)),
    ]);
    let info = builder.parse_path("a.mkv").build().expect("Build should succeed");

    let chapters = info.chapters().expect("Chapters should be present");
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[1].title.as_deref(), Some("Chapter 2"));
    assert_eq!(chapters[1].start, Duration::from_secs(60));
}

#[test]
fn parse_does_not_create_sessions() {
    let (backend, builder) = builder(vec![media_info("Matroska / WebM", 1000)]);
    let _info = builder.parse_path("a.mkv").build();
    assert!(backend.created.borrow().is_empty());
}

#[test]
fn frame_loader_is_embedded_on_request() {
    let backend = Arc::new(MockBackend::with_script(vec![
        media_info("QuickTime / MOV", 10_000),
        ParseEvent::Video(video_stream(0, "H.264")),
    ]));
    backend.frame_count.set(5);

    let mut info = MediaInfoBuilder::with_backend(Arc::clone(&backend))
        .with_frame_loader(true)
        .parse_source(&MediaSource::path("clip.mov"))
        .build()
        .expect("Build should succeed");

    assert_eq!(backend.created.borrow().len(), 1);

    let mut buffer = PixelBuffer::for_stream(info.video_stream().expect("Video stream"));
    let loader = info.frame_loader().expect("Frame loader should be present");
    assert!(loader.load_into(&mut buffer, None).expect("Loader should be live"));
    assert!(buffer.as_bytes().iter().all(|byte| *byte == 0xFF));

    info.release();
    info.release();
    assert!(info.frame_loader().is_none());
    assert_eq!(backend.live_count(), 0);
}

#[test]
fn frame_loader_open_failure_fails_build() {
    let backend = Arc::new(MockBackend::with_script(vec![media_info("QuickTime / MOV", 10_000)]));
    backend.fail_create.set(true);

    let builder = MediaInfoBuilder::with_backend(Arc::clone(&backend))
        .with_frame_loader(true)
        .parse_path("clip.mov");
    assert_eq!(builder.state(), BuildState::Failed);
    assert!(builder.build().is_none());
}

#[test]
fn frame_loader_is_not_opened_after_parse_error() {
    let backend = Arc::new(MockBackend::with_script(vec![ParseEvent::Error]));
    let info = MediaInfoBuilder::with_backend(Arc::clone(&backend))
        .with_frame_loader(true)
        .parse_path("clip.mov")
        .build();
    assert!(info.is_none());
    assert!(backend.created.borrow().is_empty());
}

#[test]
fn dropping_media_info_releases_frame_loader() {
    let backend = Arc::new(MockBackend::with_script(vec![media_info("QuickTime / MOV", 10_000)]));
    let info = MediaInfoBuilder::with_backend(Arc::clone(&backend))
        .with_frame_loader(true)
        .parse_path("clip.mov")
        .build();
    assert!(info.is_some());
    assert_eq!(backend.live_count(), 1);

    drop(info);
    assert_eq!(backend.live_count(), 0);
}

#[test]
fn json_export_contains_streams() {
    let (_backend, builder) = builder(vec![
        media_info("Matroska / WebM", 2500),
        ParseEvent::Video(video_stream(0, "VP9")),
        ParseEvent::Audio(audio_stream(1, "fra")),
    ]);
    let info = builder.parse_path("a.webm").build().expect("Build should succeed");
    let json = info.to_json();

    assert_eq!(json["format"], "Matroska / WebM");
    assert_eq!(json["duration_ms"], 2500);
    assert_eq!(json["video"]["codec"], "VP9");
    assert_eq!(json["video"]["width"], 1280);
    assert_eq!(json["audio"][0]["language"], "fra");
    assert_eq!(json["audio"][0]["channel_layout"], "stereo");
    assert!(json["subtitles"].as_array().is_some_and(Vec::is_empty));
    assert!(json["chapters"].is_null());
}
