//! Error types for the kt-session crate.
//!
//! This module provides the [`TailError`] type, the single failure type a
//! session reports. The binary maps any of them to exit status 1.

use camino::Utf8PathBuf;
use kt_core::ConfigError;
use kt_scanner::ScanError;
use kt_watcher::WatchError;

/// Errors that end a tail session.
///
/// # Error Recovery Strategy
///
/// Every variant is fatal. Overlong lines and interrupted waits are not
/// errors at all and never reach this type.
///
/// - **Config** ([`TailError::Config`]): precondition failed before any I/O
/// - **Open** ([`TailError::Open`]): initial open failed
/// - **Reopen / Seek** ([`TailError::Reopen`], [`TailError::Seek`]): resync after a change failed
/// - **Scan** ([`TailError::Scan`]): reading the file or writing the stream failed
/// - **Watch** ([`TailError::Watch`]): the change watcher broke
/// - **Output** ([`TailError::Output`]): printing the window failed
///
/// # Examples
///
/// ```
/// use kt_session::TailError;
/// use camino::Utf8PathBuf;
/// use std::io;
///
/// let err = TailError::open(
///     "/var/log/app.log",
///     io::Error::from(io::ErrorKind::PermissionDenied),
/// );
/// assert!(err.to_string().contains("/var/log/app.log"));
/// assert_eq!(err.path().map(|p| p.as_str()), Some("/var/log/app.log"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The file could not be opened for the initial scan.
    #[error("failed to open {path}: {source}")]
    Open {
        /// The file that could not be opened.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be reopened after a change.
    #[error("failed to reopen {path}: {source}")]
    Reopen {
        /// The file that could not be reopened.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Seeking the reopened file to the consumed offset failed.
    #[error("failed to seek to byte {offset}: {source}")]
    Seek {
        /// The offset that was requested.
        offset: u64,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Scanning or streaming failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The change watcher failed.
    #[error("change watcher failed: {0}")]
    Watch(#[from] WatchError),

    /// Writing the window to the output failed.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl TailError {
    /// Creates a new [`TailError::Open`] error.
    #[inline]
    pub fn open(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`TailError::Reopen`] error.
    #[inline]
    pub fn reopen(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Reopen {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the failure happened before the file was touched.
    #[inline]
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Open { path, .. } | Self::Reopen { path, .. } => Some(path),
            Self::Config(e) => e.path(),
            Self::Watch(e) => e.path(),
            Self::Seek { .. } | Self::Scan(_) | Self::Output(_) => None,
        }
    }
}
