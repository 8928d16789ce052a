//! Benchmarks for playback-path and inspection operations.
//!
//! Run with: cargo bench
//!
//! The decode benchmarks need `tests/fixtures/sample_video.mp4` and are
//! skipped without it.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::Criterion;
use mediaext::{
    Cue, ExtensionRenderer, ExtensionRendererMode, FfmpegLogLevel, FrameOptions,
    MediaInfoBuilder, MediaSource, Renderer, RendererRegistrar, TextOutput, ThumbnailRetriever,
    TimeSync, TrackType, set_ffmpeg_log_level,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

struct Discard;

impl TextOutput for Discard {
    fn on_cues(&mut self, _cues: &[Cue]) {}
}

struct Passthrough(TrackType);

impl Renderer for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn track_type(&self) -> TrackType {
        self.0
    }

    fn render(&mut self, _position_us: i64, _elapsed_realtime_us: i64) {}
}

fn benchmark_time_sync(criterion: &mut Criterion) {
    let mut sync = TimeSync::with_offset_ms(1500);
    sync.set_speed(1.25);

    criterion.bench_function("adjusted position", |bencher| {
        bencher.iter(|| sync.adjusted_position_us(black_box(42_000_000)));
    });
}

fn benchmark_subtitle_render(criterion: &mut Criterion) {
    let cues: Vec<Cue> = (0..2000)
        .map(|index| {
            let start = index * 2_000_000;
            Cue::new(start, start + 1_500_000, format!("line {index}"))
        })
        .collect();

    criterion.bench_function("render 1000 positions over 2000 cues", |bencher| {
        bencher.iter(|| {
            let mut renderers: Vec<Box<dyn Renderer>> = Vec::new();
            RendererRegistrar::new(ExtensionRendererMode::Off)
                .with_subtitle_offset_ms(250)
                .build_text_renderers(&mut renderers, cues.clone(), Box::new(Discard));
            for step in 0..1000 {
                renderers[0].render(black_box(step * 4_000_000), 0);
            }
        });
    });
}

fn benchmark_registrar(criterion: &mut Criterion) {
    criterion.bench_function("insert 4 extensions among 16 renderers", |bencher| {
        bencher.iter(|| {
            let mut renderers: Vec<Box<dyn Renderer>> = (0..16)
                .map(|index| {
                    let track_type = if index % 2 == 0 {
                        TrackType::Video
                    } else {
                        TrackType::Audio
                    };
                    Box::new(Passthrough(track_type)) as Box<dyn Renderer>
                })
                .collect();
            let extensions = (0..4)
                .map(|index| {
                    ExtensionRenderer::new(format!("ext{index}"), || {
                        Ok(Box::new(Passthrough(TrackType::Audio)) as Box<dyn Renderer>)
                    })
                })
                .collect();
            RendererRegistrar::new(ExtensionRendererMode::Prefer)
                .insert_extensions(&mut renderers, TrackType::Audio, extensions)
                .unwrap();
        });
    });
}

fn benchmark_inspection(criterion: &mut Criterion) {
    set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    criterion.bench_function("parse media info", |bencher| {
        bencher.iter(|| {
            let _info = MediaInfoBuilder::new().parse_path(SAMPLE_VIDEO).build().unwrap();
        });
    });

    criterion.bench_function("thumbnail at 1s (160px wide)", |bencher| {
        let options = FrameOptions::new().with_resolution(Some(160), None);
        bencher.iter(|| {
            let mut retriever = ThumbnailRetriever::new().with_options(options.clone());
            retriever
                .set_data_source(&MediaSource::path(SAMPLE_VIDEO))
                .unwrap();
            let _frame = retriever.frame_at_time(Some(Duration::from_secs(1))).unwrap();
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_time_sync,
    benchmark_subtitle_render,
    benchmark_registrar,
    benchmark_inspection,
);
criterion::criterion_main!(benches);
