//! Renderer boundary and time-synced wrapping.
//!
//! A host playback engine owns an ordered list of [`Renderer`]s, one or more
//! per [`TrackType`]. This module defines the slice of that contract the
//! crate needs, a composition wrapper that shifts a renderer's view of the
//! playback clock ([`TimeSyncedRenderer`]), and lookup helpers that reach
//! the wrapper's [`TimeSync`] through the host's list.
//!
//! # Example
//!
//! ```
//! use std::sync::mpsc;
//!
//! use mediaext::{Cue, Renderer, SubtitleRenderer, TimeSyncedRenderer, TrackType};
//!
//! let (sender, _receiver) = mpsc::channel::<Vec<Cue>>();
//! let subtitles = SubtitleRenderer::new(Vec::new(), Box::new(sender));
//! let mut renderers: Vec<Box<dyn Renderer>> =
//!     vec![Box::new(TimeSyncedRenderer::new(subtitles, 0))];
//!
//! mediaext::set_subtitle_delay_ms(&mut renderers, 1_500);
//! assert_eq!(mediaext::subtitle_delay_ms(&renderers), 1_500);
//! assert_eq!(renderers[0].track_type(), TrackType::Text);
//! ```

use crate::time_sync::TimeSync;

/// The kind of media a renderer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackType {
    /// Audio samples.
    Audio,
    /// Video frames.
    Video,
    /// Subtitles and captions.
    Text,
    /// Timed metadata.
    Metadata,
    /// Anything else.
    Other,
}

/// A component that consumes one track type and presents it at the
/// playback position it is given.
pub trait Renderer {
    /// Human-readable name, used in logs and errors.
    fn name(&self) -> &str;

    /// The track type this renderer handles.
    fn track_type(&self) -> TrackType;

    /// Present the content for `position_us`.
    fn render(&mut self, position_us: i64, elapsed_realtime_us: i64);

    /// Discard buffered state after a seek to `position_us`.
    fn reset_position(&mut self, _position_us: i64) {}

    /// Whether the renderer can present content at the current position.
    fn is_ready(&self) -> bool {
        true
    }

    /// Whether the renderer has presented all of its content.
    fn is_ended(&self) -> bool {
        false
    }

    /// Free any resources held by the renderer.
    fn release(&mut self) {}

    /// The time sync applied to this renderer, if it has one.
    fn time_sync(&self) -> Option<&TimeSync> {
        None
    }

    /// Mutable access to this renderer's time sync, if it has one.
    fn time_sync_mut(&mut self) -> Option<&mut TimeSync> {
        None
    }
}

/// Wraps a renderer and remaps the playback position through a [`TimeSync`]
/// before every [`render`](Renderer::render). Everything else goes straight
/// to the wrapped renderer.
#[derive(Debug)]
pub struct TimeSyncedRenderer<R> {
    inner: R,
    time_sync: TimeSync,
}

impl<R: Renderer> TimeSyncedRenderer<R> {
    /// Wrap `inner` with an initial offset in milliseconds.
    pub fn new(inner: R, offset_ms: i64) -> Self {
        Self {
            inner,
            time_sync: TimeSync::with_offset_ms(offset_ms),
        }
    }

    /// The wrapped renderer.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// The wrapped renderer, mutably.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwrap, discarding the time sync.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Renderer> Renderer for TimeSyncedRenderer<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn track_type(&self) -> TrackType {
        self.inner.track_type()
    }

    fn render(&mut self, position_us: i64, elapsed_realtime_us: i64) {
        let adjusted = self.time_sync.adjusted_position_us(position_us);
        self.inner.render(adjusted, elapsed_realtime_us);
    }

    fn reset_position(&mut self, position_us: i64) {
        self.inner.reset_position(position_us);
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn is_ended(&self) -> bool {
        self.inner.is_ended()
    }

    fn release(&mut self) {
        self.inner.release();
    }

    fn time_sync(&self) -> Option<&TimeSync> {
        Some(&self.time_sync)
    }

    fn time_sync_mut(&mut self) -> Option<&mut TimeSync> {
        Some(&mut self.time_sync)
    }
}

/// Time sync of the first renderer of `track_type` in `renderers`.
///
/// Scans in list order on every call. If the first renderer of that type
/// carries no time sync, the result is `None` even when a later one does.
pub fn find_time_sync(renderers: &[Box<dyn Renderer>], track_type: TrackType) -> Option<&TimeSync> {
    renderers
        .iter()
        .find(|renderer| renderer.track_type() == track_type)
        .and_then(|renderer| renderer.time_sync())
}

/// Mutable variant of [`find_time_sync`].
pub fn find_time_sync_mut(
    renderers: &mut [Box<dyn Renderer>],
    track_type: TrackType,
) -> Option<&mut TimeSync> {
    renderers
        .iter_mut()
        .find(|renderer| renderer.track_type() == track_type)
        .and_then(|renderer| renderer.time_sync_mut())
}

/// Subtitle delay in milliseconds, `0` when no time-synced text renderer
/// is present.
pub fn subtitle_delay_ms(renderers: &[Box<dyn Renderer>]) -> i64 {
    find_time_sync(renderers, TrackType::Text).map_or(0, TimeSync::offset_ms)
}

/// Set the subtitle delay. Does nothing when no time-synced text renderer
/// is present.
pub fn set_subtitle_delay_ms(renderers: &mut [Box<dyn Renderer>], delay_ms: i64) {
    if let Some(time_sync) = find_time_sync_mut(renderers, TrackType::Text) {
        time_sync.set_offset_ms(delay_ms);
    }
}

/// Subtitle speed multiplier, `1.0` when no time-synced text renderer is
/// present.
pub fn subtitle_speed(renderers: &[Box<dyn Renderer>]) -> f64 {
    find_time_sync(renderers, TrackType::Text).map_or(1.0, TimeSync::speed)
}

/// Set the subtitle speed multiplier (clamped). Does nothing when no
/// time-synced text renderer is present.
pub fn set_subtitle_speed(renderers: &mut [Box<dyn Renderer>], speed: f64) {
    if let Some(time_sync) = find_time_sync_mut(renderers, TrackType::Text) {
        time_sync.set_speed(speed);
    }
}
