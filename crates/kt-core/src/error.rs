//! Error types for the kt-core crate.
//!
//! This module provides the [`ConfigError`] type for configuration-related errors
//! that are detected before any file I/O takes place.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration validation.
///
/// Every variant is a usage or precondition failure: the binary reports it
/// and exits non-zero before opening the target file.
///
/// # Examples
///
/// ```
/// use kt_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::NotRegularFile(Utf8PathBuf::from("/var/log"));
/// assert!(error.to_string().contains("/var/log"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The provided path is invalid or cannot be resolved.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path.
        path: Utf8PathBuf,
        /// Explanation of why the path is invalid.
        reason: String,
    },

    /// The path resolves to something other than a regular file.
    #[error("not a regular file: {0}")]
    NotRegularFile(Utf8PathBuf),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while inspecting the target.
    #[error("failed to inspect target: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidPath`] error.
    #[inline]
    pub fn invalid_path(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::InvalidPath { path, .. } | Self::NotRegularFile(path) => Some(path),
            Self::InvalidOption { .. } | Self::Io(_) => None,
        }
    }
}
