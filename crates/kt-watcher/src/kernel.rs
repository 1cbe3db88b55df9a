//! Kernel-notification backends (kqueue and inotify) on top of `notify`.
//!
//! `notify` runs its own reader thread and forwards raw events into a
//! `std::sync::mpsc` channel. [`KernelWatch`] blocks on that channel and
//! turns the first relevant event into [`WaitOutcome::Changed`].
//!
//! ```text
//! ┌──────────────────────────┐        ┌───────────────────────────────┐
//! │ notify reader thread     │        │ session thread                │
//! │ (kqueue / inotify fd)    │ ─────► │ KernelWatch::wait             │
//! │                          │ mpsc   │   recv_timeout(check interval)│
//! └──────────────────────────┘        │   └─ stop flag between waits  │
//!                                     └───────────────────────────────┘
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use kt_core::{ShutdownFlag, WatchConfig};
use notify::{RecursiveMode, Watcher};

use crate::backend::Backend;
use crate::error::WatchError;
use crate::events::WaitOutcome;

/// A registered kernel watch on a single file.
pub struct KernelWatch<W: Watcher> {
    watcher: W,
    events: Receiver<notify::Result<notify::Event>>,
    path: Utf8PathBuf,
    backend: Backend,
    check_interval: Duration,
    shutdown: ShutdownFlag,
}

impl<W: Watcher> KernelWatch<W> {
    /// Registers interest in writes to `path`.
    pub(crate) fn new(
        backend: Backend,
        path: &Utf8Path,
        config: &WatchConfig,
        shutdown: ShutdownFlag,
    ) -> Result<Self, WatchError> {
        let (tx, events) = mpsc::channel();
        let mut watcher = W::new(tx, notify::Config::default())?;
        watcher.watch(path.as_std_path(), RecursiveMode::NonRecursive)?;

        tracing::debug!(path = %path, backend = %backend, "change watcher started");

        Ok(Self {
            watcher,
            events,
            path: path.to_owned(),
            backend,
            check_interval: config.shutdown_check(),
            shutdown,
        })
    }

    /// Blocks until a write/extend event (or a rescan request) arrives or a
    /// stop is requested.
    ///
    /// Events already queued behind the first match are drained: they
    /// describe writes the following read will pick up anyway, so each wait
    /// accounts for one detected change.
    pub(crate) fn wait(&mut self) -> Result<WaitOutcome, WatchError> {
        loop {
            if self.shutdown.is_requested() {
                return Ok(WaitOutcome::Interrupted);
            }

            match self.events.recv_timeout(self.check_interval) {
                Ok(Ok(event)) => {
                    if self.backend.signals_change(&event) {
                        tracing::trace!(kind = ?event.kind, "change detected");
                        self.drain()?;
                        return Ok(WaitOutcome::Changed);
                    }
                    tracing::trace!(kind = ?event.kind, "ignoring event");
                }
                Ok(Err(error)) => return Err(WatchError::Notify(error)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(WatchError::ChannelClosed),
            }
        }
    }

    fn drain(&mut self) -> Result<(), WatchError> {
        while let Ok(pending) = self.events.try_recv() {
            if let Err(error) = pending {
                return Err(WatchError::Notify(error));
            }
        }
        Ok(())
    }

    /// Removes the kernel watch and releases its resources.
    pub(crate) fn close(mut self) {
        // The kernel drops the watch on its own when the file is deleted.
        if let Err(error) = self.watcher.unwatch(self.path.as_std_path()) {
            tracing::debug!(path = %self.path, error = %error, "unwatch failed");
        }
        tracing::debug!(path = %self.path, backend = %self.backend, "change watcher stopped");
    }
}

impl<W: Watcher> std::fmt::Debug for KernelWatch<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelWatch")
            .field("path", &self.path)
            .field("backend", &self.backend)
            .field("check_interval", &self.check_interval)
            .finish_non_exhaustive()
    }
}
