//! Polling fallback: compare the file size against the consumed offset.
//!
//! Growth past the offset is a change. A size below the offset only counts
//! when it differs from the size seen at the previous check, so files whose
//! `stat` size never matches their content (procfs reports 0) stay quiet.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use kt_core::{ShutdownFlag, WatchConfig};

use crate::error::WatchError;
use crate::events::WaitOutcome;

/// Size-polling watch on a single file.
#[derive(Debug)]
pub struct PollWatch {
    path: Utf8PathBuf,
    interval: Duration,
    shutdown: ShutdownFlag,
    last_size: u64,
}

impl PollWatch {
    pub(crate) fn new(path: &Utf8Path, config: &WatchConfig, shutdown: ShutdownFlag) -> Self {
        tracing::debug!(path = %path, interval_ms = config.poll_interval_ms, "poll watcher started");
        Self {
            path: path.to_owned(),
            interval: config.poll_interval(),
            shutdown,
            last_size: path.metadata().map_or(0, |m| m.len()),
        }
    }

    /// Blocks until the file grows past `offset` or shrinks below it.
    ///
    /// The stop flag is checked after every sleep.
    pub(crate) fn wait(&mut self, offset: u64) -> Result<WaitOutcome, WatchError> {
        loop {
            // `metadata` follows symlinks, like stat(2).
            let size = self.path.metadata()?.len();
            let shrunk = size < offset && size != self.last_size;
            self.last_size = size;
            if size > offset || shrunk {
                tracing::trace!(size, offset, "size changed");
                return Ok(WaitOutcome::Changed);
            }

            std::thread::sleep(self.interval);

            if self.shutdown.is_requested() {
                return Ok(WaitOutcome::Interrupted);
            }
        }
    }

    pub(crate) fn close(self) {
        tracing::debug!(path = %self.path, "poll watcher stopped");
    }
}
