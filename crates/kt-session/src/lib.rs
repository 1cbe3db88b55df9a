//! Tail session orchestration for ktail.
//!
//! A [`TailSession`] ties the other crates together:
//!
//! 1. validate the [`TailConfig`](kt_core::TailConfig) and open the file
//! 2. scan it once into a [`LineRing`](kt_scanner::LineRing) and print the
//!    last-N window
//! 3. in follow mode, wait on a [`ChangeWatcher`](kt_watcher::ChangeWatcher),
//!    reopen on every change, seek to the consumed offset, and stream what
//!    follows it
//!
//! The loop ends when the shared [`ShutdownFlag`](kt_core::ShutdownFlag) is
//! raised. A file that shrinks below the consumed offset is treated as
//! truncated: a warning is logged and streaming restarts at byte 0.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod session;

pub use error::TailError;
pub use session::{SessionState, SessionSummary, TailSession};

use std::io::Write;

use kt_core::{ShutdownFlag, TailConfig};

/// Runs a session with the platform's default change backend.
///
/// # Errors
///
/// See [`TailSession::run`].
pub fn run<W: Write>(
    config: TailConfig,
    shutdown: ShutdownFlag,
    out: W,
) -> Result<SessionSummary, TailError> {
    TailSession::new(config, shutdown, out).run()
}
