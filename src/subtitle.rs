//! Cue-list subtitle rendering.
//!
//! [`SubtitleRenderer`] holds a list of timed [`Cue`]s and, on each
//! [`render`](Renderer::render), hands the cues active at that position to
//! a [`TextOutput`]. It only emits when the active set changes. Positions
//! outside the media (negative, or past every cue) show nothing.
//!
//! Wrap it in a [`TimeSyncedRenderer`](crate::TimeSyncedRenderer) to make
//! its delay and speed adjustable at runtime.

use std::sync::mpsc::Sender;

use crate::renderer::{Renderer, TrackType};

/// A timed piece of subtitle text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Start of the display window, in microseconds.
    pub start_us: i64,
    /// End of the display window (exclusive), in microseconds.
    pub end_us: i64,
    /// Text to display.
    pub text: String,
}

impl Cue {
    /// A cue shown from `start_us` until just before `end_us`.
    pub fn new<S: Into<String>>(start_us: i64, end_us: i64, text: S) -> Self {
        Self {
            start_us,
            end_us,
            text: text.into(),
        }
    }

    /// Whether the cue is on screen at `position_us`.
    pub fn is_active_at(&self, position_us: i64) -> bool {
        self.start_us <= position_us && position_us < self.end_us
    }
}

/// Receiver of the active cue set.
pub trait TextOutput {
    /// Called whenever the set of active cues changes. An empty slice clears
    /// the display.
    fn on_cues(&mut self, cues: &[Cue]);
}

impl TextOutput for Sender<Vec<Cue>> {
    fn on_cues(&mut self, cues: &[Cue]) {
        if self.send(cues.to_vec()).is_err() {
            log::debug!("Subtitle receiver hung up");
        }
    }
}

/// Text renderer over an in-memory cue list.
pub struct SubtitleRenderer {
    cues: Vec<Cue>,
    output: Box<dyn TextOutput + Send>,
    active: Vec<usize>,
    last_end_us: i64,
    position_us: i64,
}

impl SubtitleRenderer {
    /// Renderer over `cues`, delivering to `output`. Cues are sorted by
    /// start time.
    pub fn new(mut cues: Vec<Cue>, output: Box<dyn TextOutput + Send>) -> Self {
        cues.sort_by_key(|cue| (cue.start_us, cue.end_us));
        let last_end_us = cues.iter().map(|cue| cue.end_us).max().unwrap_or(0);
        Self {
            cues,
            output,
            active: Vec::new(),
            last_end_us,
            position_us: 0,
        }
    }

    /// The cue list, sorted by start time.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// The position passed to the most recent render, after any remapping.
    pub fn position_us(&self) -> i64 {
        self.position_us
    }

    fn active_at(&self, position_us: i64) -> Vec<usize> {
        if position_us < 0 {
            return Vec::new();
        }
        self.cues
            .iter()
            .enumerate()
            .take_while(|(_, cue)| cue.start_us <= position_us)
            .filter(|(_, cue)| cue.is_active_at(position_us))
            .map(|(index, _)| index)
            .collect()
    }

    fn emit(&mut self, active: Vec<usize>) {
        if active == self.active {
            return;
        }
        let cues: Vec<Cue> = active.iter().map(|&index| self.cues[index].clone()).collect();
        self.active = active;
        self.output.on_cues(&cues);
    }
}

impl Renderer for SubtitleRenderer {
    fn name(&self) -> &str {
        "SubtitleRenderer"
    }

    fn track_type(&self) -> TrackType {
        TrackType::Text
    }

    fn render(&mut self, position_us: i64, _elapsed_realtime_us: i64) {
        self.position_us = position_us;
        let active = self.active_at(position_us);
        self.emit(active);
    }

    fn reset_position(&mut self, position_us: i64) {
        self.position_us = position_us;
        self.emit(Vec::new());
    }

    fn is_ended(&self) -> bool {
        self.position_us >= self.last_end_us
    }

    fn release(&mut self) {
        self.emit(Vec::new());
        self.cues.clear();
        self.last_end_us = 0;
    }
}

impl std::fmt::Debug for SubtitleRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleRenderer")
            .field("cues", &self.cues.len())
            .field("active", &self.active)
            .field("position_us", &self.position_us)
            .finish_non_exhaustive()
    }
}
