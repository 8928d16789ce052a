//! Frame output configuration.
//!
//! [`FrameOptions`] controls how decoded frames are converted before they
//! are handed back from a [`ThumbnailRetriever`](crate::ThumbnailRetriever):
//! output resolution, scaler quality, and whether the stream's display
//! rotation is applied.
//!
//! # Example
//!
//! ```no_run
//! use mediaext::{FrameOptions, MediaSource, ScalingQuality, ThumbnailRetriever};
//!
//! let options = FrameOptions::new()
//!     .with_resolution(Some(320), None)
//!     .with_scaling(ScalingQuality::Bicubic)
//!     .with_rotation(true);
//! let mut retriever = ThumbnailRetriever::new().with_options(options);
//! retriever.set_data_source(&MediaSource::path("input.mp4"))?;
//! # Ok::<(), mediaext::MediaExtError>(())
//! ```

use ffmpeg_next::software::scaling::Flags as ScalingFlags;

/// Scaler quality used when converting decoded frames to RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingQuality {
    /// Fast bilinear; lowest quality.
    FastBilinear,
    /// Bilinear. This is the default.
    #[default]
    Bilinear,
    /// Bicubic; sharper and slower.
    Bicubic,
}

impl ScalingQuality {
    pub(crate) fn to_ffmpeg_flags(self) -> ScalingFlags {
        match self {
            ScalingQuality::FastBilinear => ScalingFlags::FAST_BILINEAR,
            ScalingQuality::Bilinear => ScalingFlags::BILINEAR,
            ScalingQuality::Bicubic => ScalingFlags::BICUBIC,
        }
    }
}

/// Output settings for decoded frames.
///
/// With no dimensions set, frames keep the source resolution. Setting one
/// dimension while [`maintain_aspect_ratio`](FrameOptions::maintain_aspect_ratio)
/// is `true` derives the other from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOptions {
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// Derive the missing dimension from the source aspect ratio.
    pub maintain_aspect_ratio: bool,
    /// Scaler quality.
    pub scaling: ScalingQuality,
    /// Rotate frames upright according to the stream's display matrix.
    pub apply_rotation: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect_ratio: true,
            scaling: ScalingQuality::Bilinear,
            apply_rotation: false,
        }
    }
}

impl FrameOptions {
    /// Source resolution, bilinear scaling, no rotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a target resolution. `None` keeps the source value for that axis.
    #[must_use]
    pub fn with_resolution(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Control aspect-ratio preservation. Defaults to `true`.
    #[must_use]
    pub fn with_maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.maintain_aspect_ratio = maintain;
        self
    }

    /// Set the scaler quality.
    #[must_use]
    pub fn with_scaling(mut self, scaling: ScalingQuality) -> Self {
        self.scaling = scaling;
        self
    }

    /// Apply the display rotation to returned frames.
    #[must_use]
    pub fn with_rotation(mut self, apply: bool) -> Self {
        self.apply_rotation = apply;
        self
    }

    /// Resolve the output `(width, height)` for a source of the given size.
    pub fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(width), Some(height)) => (width, height),
            (Some(width), None) if self.maintain_aspect_ratio && source_width > 0 => {
                let ratio = width as f64 / source_width as f64;
                let height = (source_height as f64 * ratio).round() as u32;
                (width, height.max(1))
            }
            (Some(width), None) => (width, source_height),
            (None, Some(height)) if self.maintain_aspect_ratio && source_height > 0 => {
                let ratio = height as f64 / source_height as f64;
                let width = (source_width as f64 * ratio).round() as u32;
                (width.max(1), height)
            }
            (None, Some(height)) => (source_width, height),
            (None, None) => (source_width, source_height),
        }
    }
}
