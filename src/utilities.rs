//! Internal utility functions.
//!
//! Pixel copying, rotation and timestamp helpers shared by the FFmpeg
//! backend.

use std::time::Duration;

use ffmpeg_next::frame::Video as VideoFrame;
use image::{RgbaImage, imageops};

/// Bytes per RGBA pixel.
const RGBA_BYTES: usize = 4;

/// Copy an RGBA video frame into a tightly packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 4).
/// This strips it so the result can go straight into
/// [`RgbaImage::from_raw`].
pub(crate) fn frame_to_rgba_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * RGBA_BYTES;
    let rows = height as usize;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * rows].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * rows);
        for row in 0..rows {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Build an [`RgbaImage`] from a scaled RGBA frame.
pub(crate) fn frame_to_image(video_frame: &VideoFrame, width: u32, height: u32) -> Option<RgbaImage> {
    RgbaImage::from_raw(width, height, frame_to_rgba_buffer(video_frame, width, height))
}

/// Rotate an image clockwise by a multiple of 90 degrees.
pub(crate) fn rotate_clockwise(image: RgbaImage, degrees: u32) -> RgbaImage {
    match degrees {
        90 => imageops::rotate90(&image),
        180 => imageops::rotate180(&image),
        270 => imageops::rotate270(&image),
        _ => image,
    }
}

/// Whether a rotation swaps width and height.
pub(crate) fn swaps_dimensions(degrees: u32) -> bool {
    degrees == 90 || degrees == 270
}

/// Fold any angle into `[0, 360)` and snap it to the nearest quarter turn.
pub(crate) fn normalize_rotation(degrees: i64) -> u32 {
    let folded = degrees.rem_euclid(360);
    (((folded + 45) / 90 % 4) * 90) as u32
}

/// Convert an `AV_TIME_BASE` (microsecond) value to a [`Duration`] at
/// millisecond precision. Unknown or negative values become zero.
pub(crate) fn micros_to_duration(micros: i64) -> Duration {
    if micros <= 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((micros / 1000) as u64)
    }
}

/// Convert a [`Duration`] to `AV_TIME_BASE` microseconds, saturating.
pub(crate) fn duration_to_micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

/// Rescale a timestamp in `numerator/denominator` units to a [`Duration`].
pub(crate) fn timestamp_to_duration(timestamp: i64, numerator: i32, denominator: i32) -> Duration {
    if timestamp <= 0 || denominator == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(timestamp as f64 * numerator as f64 / denominator as f64)
}
