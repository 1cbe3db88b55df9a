//! Cooperative stop signal for the follow loop.
//!
//! The binary's signal handler calls [`ShutdownFlag::request`]; the session
//! and the change watcher poll [`ShutdownFlag::is_requested`] once per loop
//! iteration. Nothing is woken instantly, so latency is bounded by the
//! watcher's wait interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "stop requested" flag.
///
/// Clones share the same underlying flag.
///
/// # Examples
///
/// ```
/// use kt_core::ShutdownFlag;
///
/// let flag = ShutdownFlag::new();
/// let handler_side = flag.clone();
///
/// assert!(!flag.is_requested());
/// handler_side.request();
/// assert!(flag.is_requested());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Creates a flag in the "keep running" state.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. Idempotent.
    #[inline]
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Returns `true` once a stop has been requested.
    #[inline]
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
