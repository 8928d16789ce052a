//! Media source references.
//!
//! A [`MediaSource`] names exactly one of the three inputs the native layer
//! understands: a filesystem path, an open file descriptor, or a remote URL.
//! Resolving higher-level identifiers (content-provider URIs and the like)
//! into one of these is the host's job; [`MediaSource::from_uri`] only
//! handles the schemes that need no resolution.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::fd::{AsRawFd, BorrowedFd};

use crate::error::MediaExtError;

/// A media source the native layer can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// An absolute or relative filesystem path.
    Path(PathBuf),
    /// A raw file descriptor number. The descriptor is only read during the
    /// session-creation call; the caller keeps ownership of it.
    FileDescriptor(i32),
    /// A remote URL, passed to the demuxer untouched.
    Url(String),
}

impl MediaSource {
    /// Source for a filesystem path.
    pub fn path<P: AsRef<Path>>(path: P) -> Self {
        MediaSource::Path(path.as_ref().to_path_buf())
    }

    /// Source for a remote URL.
    pub fn url<S: Into<String>>(url: S) -> Self {
        MediaSource::Url(url.into())
    }

    /// Source for a borrowed file descriptor.
    ///
    /// Only the descriptor number is recorded, so the borrow ends when this
    /// returns. The descriptor must stay open until the session that uses
    /// it has been created.
    #[cfg(unix)]
    pub fn descriptor(fd: BorrowedFd<'_>) -> Self {
        MediaSource::FileDescriptor(fd.as_raw_fd())
    }

    /// Interpret a URI string.
    ///
    /// Any scheme beginning with `http` (so `http`, `https`, `httpproxy`)
    /// passes through as [`MediaSource::Url`]. `file://` URIs and bare
    /// paths become [`MediaSource::Path`].
    ///
    /// # Errors
    ///
    /// Returns [`MediaExtError::UnsupportedScheme`] for every other scheme.
    ///
    /// # Example
    ///
    /// ```
    /// use mediaext::MediaSource;
    ///
    /// let remote = MediaSource::from_uri("https://example.com/a.mp4")?;
    /// assert!(matches!(remote, MediaSource::Url(_)));
    ///
    /// let local = MediaSource::from_uri("file:///sdcard/Movies/a.mkv")?;
    /// assert_eq!(local, MediaSource::path("/sdcard/Movies/a.mkv"));
    /// # Ok::<(), mediaext::MediaExtError>(())
    /// ```
    pub fn from_uri(uri: &str) -> Result<Self, MediaExtError> {
        let Some(scheme) = uri_scheme(uri) else {
            return Ok(MediaSource::path(uri));
        };

        let lowered = scheme.to_ascii_lowercase();
        if lowered.starts_with("http") {
            return Ok(MediaSource::Url(uri.to_string()));
        }
        if lowered == "file" {
            let rest = &uri[scheme.len() + 1..];
            let path = rest.strip_prefix("//").unwrap_or(rest);
            return Ok(MediaSource::path(path));
        }

        Err(MediaExtError::UnsupportedScheme(scheme.to_string()))
    }

    /// The string handed to the demuxer for this source.
    pub(crate) fn demuxer_target(&self) -> PathBuf {
        match self {
            MediaSource::Path(path) => path.clone(),
            MediaSource::FileDescriptor(fd) => PathBuf::from(format!("/proc/self/fd/{fd}")),
            MediaSource::Url(url) => PathBuf::from(url),
        }
    }
}

impl Display for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaSource::Path(path) => write!(f, "path {}", path.display()),
            MediaSource::FileDescriptor(fd) => write!(f, "fd {fd}"),
            MediaSource::Url(url) => write!(f, "url {url}"),
        }
    }
}

impl From<PathBuf> for MediaSource {
    fn from(path: PathBuf) -> Self {
        MediaSource::Path(path)
    }
}

impl From<&Path> for MediaSource {
    fn from(path: &Path) -> Self {
        MediaSource::path(path)
    }
}

/// Extract the RFC 3986 scheme of `uri`, if it has one.
///
/// Single-letter schemes are treated as Windows drive letters, not schemes.
fn uri_scheme(uri: &str) -> Option<&str> {
    let colon = uri.find(':')?;
    let scheme = &uri[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() || scheme.len() < 2 {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}
