//! Extension renderer placement.
//!
//! Hosts build their own renderers for each track type first, then hand the
//! list to a [`RendererRegistrar`], which slots this crate's extension
//! renderers in according to an [`ExtensionRendererMode`]:
//!
//! | mode     | insertion point                                  |
//! |----------|--------------------------------------------------|
//! | `Off`    | nothing is inserted                              |
//! | `On`     | right after the last renderer of the same type   |
//! | `Prefer` | right before the last renderer of the same type  |
//!
//! Placement is anchored on the last renderer of the same type, not on the
//! end of the list. Hosts build renderers grouped by type, so for them this
//! is the same as inserting at `len` (`On`) or `len - 1` (`Prefer`); in a
//! mixed list the extensions stay next to their own track type.
//!
//! When no renderer of the type exists yet, extensions are appended. A
//! renderer that fails to construct aborts the whole insertion with
//! [`MediaExtError::ExtensionRendererInit`]; it is never skipped.

use crate::error::{BoxError, MediaExtError};
use crate::renderer::{Renderer, TimeSyncedRenderer, TrackType};
use crate::subtitle::{Cue, SubtitleRenderer, TextOutput};

/// Where extension renderers go relative to the host's own renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionRendererMode {
    /// Do not use extension renderers.
    #[default]
    Off,
    /// Use them after the host's renderers of the same type.
    On,
    /// Use them ahead of the last host renderer of the same type.
    Prefer,
}

type RendererFactory = Box<dyn FnOnce() -> Result<Box<dyn Renderer>, BoxError>>;

/// A named, deferred renderer constructor.
pub struct ExtensionRenderer {
    name: String,
    factory: RendererFactory,
}

impl ExtensionRenderer {
    /// Register `factory` under `name`. It runs only if the mode allows the
    /// insertion.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn Renderer>, BoxError> + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
        }
    }

    /// The name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn construct(self) -> Result<Box<dyn Renderer>, MediaExtError> {
        let name = self.name;
        (self.factory)().map_err(|source| MediaExtError::ExtensionRendererInit {
            renderer: name,
            source,
        })
    }
}

impl std::fmt::Debug for ExtensionRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRenderer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Places extension renderers into a host-built renderer list.
///
/// # Example
///
/// ```
/// use mediaext::{ExtensionRendererMode, Renderer, RendererRegistrar, TrackType};
///
/// struct Host(TrackType);
///
/// impl Renderer for Host {
///     fn name(&self) -> &str { "host" }
///     fn track_type(&self) -> TrackType { self.0 }
///     fn render(&mut self, _: i64, _: i64) {}
/// }
///
/// let registrar = RendererRegistrar::new(ExtensionRendererMode::Prefer);
/// let out: Vec<Box<dyn Renderer>> = vec![Box::new(Host(TrackType::Audio)), Box::new(Host(TrackType::Audio))];
/// assert_eq!(registrar.insertion_index(&out, TrackType::Audio), Some(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererRegistrar {
    mode: ExtensionRendererMode,
    subtitle_offset_ms: i64,
}

impl RendererRegistrar {
    /// Registrar for `mode` with no initial subtitle offset.
    pub fn new(mode: ExtensionRendererMode) -> Self {
        Self {
            mode,
            subtitle_offset_ms: 0,
        }
    }

    /// Initial delay for subtitle renderers built by
    /// [`build_text_renderers`](RendererRegistrar::build_text_renderers).
    #[must_use]
    pub fn with_subtitle_offset_ms(mut self, offset_ms: i64) -> Self {
        self.subtitle_offset_ms = offset_ms;
        self
    }

    /// The configured mode.
    pub fn mode(&self) -> ExtensionRendererMode {
        self.mode
    }

    /// The configured initial subtitle offset.
    pub fn subtitle_offset_ms(&self) -> i64 {
        self.subtitle_offset_ms
    }

    /// Index at which extensions for `track_type` would be inserted, or
    /// `None` when the mode is `Off`.
    pub fn insertion_index(
        &self,
        out: &[Box<dyn Renderer>],
        track_type: TrackType,
    ) -> Option<usize> {
        let last_same_type = out
            .iter()
            .rposition(|renderer| renderer.track_type() == track_type);
        match (self.mode, last_same_type) {
            (ExtensionRendererMode::Off, _) => None,
            (_, None) => Some(out.len()),
            (ExtensionRendererMode::On, Some(index)) => Some(index + 1),
            (ExtensionRendererMode::Prefer, Some(index)) => Some(index),
        }
    }

    /// Construct and insert `extensions` for `track_type`, consecutively and
    /// in order, at the mode's insertion point. Returns how many were
    /// inserted.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::ExtensionRendererInit`] for the first
    /// extension that fails to construct. Extensions inserted before it stay
    /// in `out`.
    pub fn insert_extensions(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        track_type: TrackType,
        extensions: Vec<ExtensionRenderer>,
    ) -> Result<usize, MediaExtError> {
        let Some(mut index) = self.insertion_index(out, track_type) else {
            return Ok(0);
        };

        let mut inserted = 0;
        for extension in extensions {
            let name = extension.name.clone();
            let renderer = extension.construct()?;
            out.insert(index, renderer);
            log::info!("Loaded {name} at renderer index {index}");
            index += 1;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Construct and insert a single extension. Returns `true` if it was
    /// inserted, `false` when the mode is `Off`.
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::ExtensionRendererInit`] if construction
    /// fails.
    pub fn insert_extension(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        track_type: TrackType,
        extension: ExtensionRenderer,
    ) -> Result<bool, MediaExtError> {
        self.insert_extensions(out, track_type, vec![extension])
            .map(|inserted| inserted > 0)
    }

    /// Append a time-synced [`SubtitleRenderer`] over `cues` that delivers
    /// to `output`, starting at the configured subtitle offset. Text
    /// renderers are added regardless of the mode.
    pub fn build_text_renderers(
        &self,
        out: &mut Vec<Box<dyn Renderer>>,
        cues: Vec<Cue>,
        output: Box<dyn TextOutput + Send>,
    ) {
        let renderer = SubtitleRenderer::new(cues, output);
        out.push(Box::new(TimeSyncedRenderer::new(
            renderer,
            self.subtitle_offset_ms,
        )));
        log::debug!(
            "Added subtitle renderer with {}ms offset",
            self.subtitle_offset_ms
        );
    }
}
