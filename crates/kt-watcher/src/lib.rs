//! Blocking change detection for a followed file.
//!
//! This crate answers one question for the follow loop: "has the file
//! changed yet?" [`ChangeWatcher::wait`] blocks the calling thread until the
//! file was written or extended, a stop was requested, or the backend failed.
//!
//! # Backends
//!
//! | Backend | Platforms | Mechanism |
//! |---|---|---|
//! | [`Backend::Kqueue`] | macOS, iOS, BSDs | `EVFILT_VNODE` write/extend via `notify` |
//! | [`Backend::Inotify`] | Linux, Android | `IN_MODIFY` via `notify` |
//! | [`Backend::Poll`] | everywhere | size check every 500 ms |
//!
//! The backend is fixed at compile time by [`Backend::platform_default`];
//! the others remain constructible where the platform supports them.
//!
//! # Shutdown
//!
//! A signal handler in Rust cannot interrupt another thread's blocking call,
//! so every backend bounds how long it blocks: the polling backend checks the
//! [`ShutdownFlag`](kt_core::ShutdownFlag) after each sleep, the kernel
//! backends after each `shutdown_check_ms` slice of waiting. A requested stop
//! surfaces as [`WaitOutcome::Interrupted`].
//!
//! # Crate Dependencies
//!
//! ```text
//! kt-cli ──► kt-session ──► kt-watcher ──► kt-core
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod events;
#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
))]
mod kernel;
mod poll;
pub mod watcher;

pub use backend::Backend;
pub use error::WatchError;
pub use events::WaitOutcome;
pub use watcher::ChangeWatcher;
