//! Error types for the kt-scanner crate.
//!
//! This module provides the [`ScanError`] type for I/O faults during a
//! bounded or streaming scan.

/// Errors that can occur while scanning a file.
///
/// A clean end-of-file is never an error, and overlong lines are handled by
/// truncation with a warning. What remains are genuine I/O faults.
///
/// # Error Recovery Strategy
///
/// - **Read errors** ([`ScanError::Read`]): Fatal - the session stops
/// - **Write errors** ([`ScanError::Write`]): Fatal - output is gone
///
/// # Examples
///
/// ```
/// use kt_scanner::ScanError;
///
/// fn handle_error(err: ScanError) {
///     match err {
///         ScanError::Read(e) => eprintln!("Read error: {e}"),
///         ScanError::Write(e) => eprintln!("Write error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Reading from the file failed.
    #[error("failed to read file: {0}")]
    Read(#[source] std::io::Error),

    /// Writing scanned content to the output failed.
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
}

impl ScanError {
    /// Returns the underlying I/O error.
    #[must_use]
    pub const fn io_error(&self) -> &std::io::Error {
        match self {
            Self::Read(e) | Self::Write(e) => e,
        }
    }
}
