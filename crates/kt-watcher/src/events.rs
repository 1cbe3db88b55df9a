//! Result type of a blocking wait.

use serde::Serialize;

/// Why [`ChangeWatcher::wait`](crate::ChangeWatcher::wait) returned.
///
/// Both outcomes are successes. The caller reacts to `Changed` by reopening
/// and streaming; on `Interrupted` it re-checks its stop flag and, if still
/// running, simply waits again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    /// The file was written, extended, or (polling) changed size.
    Changed,
    /// The wait was cut short by a stop request.
    Interrupted,
}

impl WaitOutcome {
    /// Returns `true` for [`WaitOutcome::Changed`].
    #[inline]
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}
