//! The [`ChangeWatcher`] dispatch type.
//!
//! # Usage
//!
//! ```no_run
//! use camino::Utf8Path;
//! use kt_core::{ShutdownFlag, WatchConfig};
//! use kt_watcher::{Backend, ChangeWatcher, WaitOutcome};
//!
//! # fn example() -> Result<(), kt_watcher::WatchError> {
//! let stop = ShutdownFlag::new();
//! let mut watcher = ChangeWatcher::new(
//!     Backend::platform_default(),
//!     Utf8Path::new("/var/log/syslog"),
//!     &WatchConfig::default(),
//!     stop.clone(),
//! )?;
//!
//! let consumed = 0;
//! while !stop.is_requested() {
//!     if watcher.wait(consumed)? == WaitOutcome::Changed {
//!         // reopen, seek to `consumed`, stream
//!     }
//! }
//! watcher.close();
//! # Ok(())
//! # }
//! ```

use camino::Utf8Path;
use kt_core::{ShutdownFlag, WatchConfig};

use crate::backend::Backend;
use crate::error::WatchError;
use crate::events::WaitOutcome;
use crate::poll::PollWatch;

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
))]
use crate::kernel::KernelWatch;

/// Blocks the calling thread until a watched file changes.
///
/// A closed set of backends behind one contract:
///
/// 1. **Setup**: [`ChangeWatcher::new`] registers the watch.
/// 2. **Wait**: [`ChangeWatcher::wait`] blocks until the file was written or
///    extended ([`WaitOutcome::Changed`]), a stop was requested
///    ([`WaitOutcome::Interrupted`]), or the backend failed (`Err`).
/// 3. **Teardown**: [`ChangeWatcher::close`] releases the OS resources.
///    Dropping the watcher does the same without logging.
///
/// Callers never branch on the variant.
#[derive(Debug)]
pub enum ChangeWatcher {
    /// kqueue `EVFILT_VNODE` watch for `NOTE_WRITE | NOTE_EXTEND`.
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
    ))]
    Kqueue(KernelWatch<notify::KqueueWatcher>),

    /// inotify `IN_MODIFY` watch.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Inotify(KernelWatch<notify::INotifyWatcher>),

    /// Size polling.
    Poll(PollWatch),
}

impl ChangeWatcher {
    /// Starts watching `path` with the given backend.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the path does not exist,
    /// [`WatchError::UnsupportedBackend`] if `backend` is not available on
    /// this platform, and [`WatchError::Notify`] if the kernel watch cannot
    /// be registered.
    pub fn new(
        backend: Backend,
        path: &Utf8Path,
        config: &WatchConfig,
        shutdown: ShutdownFlag,
    ) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }

        match backend {
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
            ))]
            Backend::Kqueue => Ok(Self::Kqueue(KernelWatch::new(
                backend, path, config, shutdown,
            )?)),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Inotify => Ok(Self::Inotify(KernelWatch::new(
                backend, path, config, shutdown,
            )?)),
            Backend::Poll => Ok(Self::Poll(PollWatch::new(path, config, shutdown))),
            #[allow(unreachable_patterns)]
            unsupported => Err(WatchError::UnsupportedBackend(unsupported)),
        }
    }

    /// Starts watching `path` with this platform's default backend.
    ///
    /// # Errors
    ///
    /// See [`ChangeWatcher::new`].
    pub fn platform_default(
        path: &Utf8Path,
        config: &WatchConfig,
        shutdown: ShutdownFlag,
    ) -> Result<Self, WatchError> {
        Self::new(Backend::platform_default(), path, config, shutdown)
    }

    /// Blocks until the file changes or a stop is requested.
    ///
    /// `offset` is the number of bytes already consumed; only the polling
    /// backend looks at it.
    ///
    /// # Errors
    ///
    /// Returns a [`WatchError`] if the event source fails. Every error is
    /// fatal to the follow loop.
    pub fn wait(&mut self, offset: u64) -> Result<WaitOutcome, WatchError> {
        match self {
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
            ))]
            Self::Kqueue(watch) => watch.wait(),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Self::Inotify(watch) => watch.wait(),
            Self::Poll(watch) => watch.wait(offset),
        }
    }

    /// The backend in use.
    #[must_use]
    pub const fn backend(&self) -> Backend {
        match self {
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
            ))]
            Self::Kqueue(_) => Backend::Kqueue,
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Self::Inotify(_) => Backend::Inotify,
            Self::Poll(_) => Backend::Poll,
        }
    }

    /// Stops watching and releases the backend's resources.
    pub fn close(self) {
        match self {
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
            ))]
            Self::Kqueue(watch) => watch.close(),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Self::Inotify(watch) => watch.close(),
            Self::Poll(watch) => watch.close(),
        }
    }
}
