//! Playback-position remapping for time-shifted tracks.
//!
//! A [`TimeSync`] turns the player clock into the position a renderer should
//! present. Speed scales first, then the offset shifts:
//!
//! ```text
//! adjusted_us = round(position_us × speed) − offset_ms × 1000
//! ```
//!
//! A positive offset delays the track (content shows up later on the player
//! clock). Results may fall outside the media; renderers treat such
//! positions as "nothing to show".
//!
//! ```
//! use mediaext::TimeSync;
//!
//! let mut sync = TimeSync::new();
//! sync.set_offset_ms(2_000);
//! assert_eq!(sync.adjusted_position_us(5_000_000), 3_000_000);
//!
//! sync.set_offset_ms(-1_000);
//! sync.set_speed(2.0);
//! assert_eq!(sync.adjusted_position_us(5_000_000), 11_000_000);
//! ```

/// Lowest accepted playback speed multiplier.
pub const MIN_SPEED: f64 = 0.1;
/// Highest accepted playback speed multiplier.
pub const MAX_SPEED: f64 = 10.0;

/// Offset and speed applied to a renderer's view of the playback position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSync {
    offset_ms: i64,
    speed: f64,
}

impl Default for TimeSync {
    fn default() -> Self {
        Self {
            offset_ms: 0,
            speed: 1.0,
        }
    }
}

impl TimeSync {
    /// Identity mapping: no offset, normal speed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping with an initial offset in milliseconds.
    pub fn with_offset_ms(offset_ms: i64) -> Self {
        Self {
            offset_ms,
            ..Self::default()
        }
    }

    /// Current offset in milliseconds.
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    /// Set the offset in milliseconds. Any value is accepted.
    pub fn set_offset_ms(&mut self, offset_ms: i64) {
        self.offset_ms = offset_ms;
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the speed multiplier, clamped to [`MIN_SPEED`]..=[`MAX_SPEED`].
    /// NaN resets the speed to `1.0`.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_nan() {
            1.0
        } else {
            speed.clamp(MIN_SPEED, MAX_SPEED)
        };
    }

    /// Map a player position in microseconds to the renderer's position.
    /// Saturates instead of overflowing.
    pub fn adjusted_position_us(&self, position_us: i64) -> i64 {
        // `as` saturates at the i64 bounds for out-of-range floats.
        let scaled = (position_us as f64 * self.speed).round() as i64;
        scaled.saturating_sub(self.offset_ms.saturating_mul(1000))
    }
}

