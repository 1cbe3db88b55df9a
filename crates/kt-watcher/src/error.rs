//! Error types for the kt-watcher crate.
//!
//! This module provides the [`WatchError`] type for errors that can occur
//! while setting up or waiting on a change watcher.

use camino::Utf8PathBuf;

use crate::backend::Backend;

/// Errors that can occur during change detection.
///
/// An interrupted wait is not an error; it is reported as
/// [`WaitOutcome::Interrupted`](crate::WaitOutcome::Interrupted).
///
/// # Error Recovery Strategy
///
/// - **Notify errors** ([`WatchError::Notify`]): Fatal - the kernel watch is broken
/// - **Path not found** ([`WatchError::PathNotFound`]): Fatal - nothing to watch
/// - **Channel closed** ([`WatchError::ChannelClosed`]): Fatal - event source gone
/// - **Unsupported backend** ([`WatchError::UnsupportedBackend`]): Fatal - wrong platform
/// - **I/O errors** ([`WatchError::Io`]): Fatal - the file could not be inspected
///
/// # Examples
///
/// ```
/// use kt_watcher::WatchError;
///
/// fn handle_error(err: WatchError) {
///     match err {
///         WatchError::Notify(e) => eprintln!("Notify error: {e}"),
///         WatchError::PathNotFound(p) => eprintln!("Path not found: {p}"),
///         WatchError::ChannelClosed => eprintln!("Channel closed"),
///         WatchError::UnsupportedBackend(b) => eprintln!("Unsupported: {b}"),
///         WatchError::Io(e) => eprintln!("I/O error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Failed to register or operate the kernel watcher.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The file to watch does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The kernel event channel was closed unexpectedly.
    #[error("event channel closed unexpectedly")]
    ChannelClosed,

    /// The requested backend is not available on this platform.
    #[error("{0} change notification is not available on this platform")]
    UnsupportedBackend(Backend),

    /// An I/O error occurred while inspecting the watched file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) => Some(path),
            Self::Notify(_) | Self::ChannelClosed | Self::UnsupportedBackend(_) | Self::Io(_) => {
                None
            }
        }
    }
}
