//! Backend identifiers and platform selection.

use std::fmt;

use notify::EventKind;
use notify::event::ModifyKind;
use serde::Serialize;

/// The change-detection mechanism behind a [`ChangeWatcher`](crate::ChangeWatcher).
///
/// Every variant exists on every platform so it can be named in logs and
/// errors; [`is_supported`](Self::is_supported) tells whether it can be
/// built here.
///
/// # Examples
///
/// ```
/// use kt_watcher::Backend;
///
/// let backend = Backend::platform_default();
/// assert!(backend.is_supported());
/// assert!(Backend::Poll.is_supported());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// BSD/macOS kernel event queue, watching for write and extend events.
    Kqueue,
    /// Linux inotify, watching for modify events.
    Inotify,
    /// Periodic size comparison; works everywhere.
    Poll,
}

impl Backend {
    /// The backend this build uses when following a file.
    ///
    /// Chosen at compile time: inotify on Linux and Android, kqueue on macOS
    /// and the BSDs, polling elsewhere.
    #[must_use]
    pub const fn platform_default() -> Self {
        if cfg!(any(target_os = "linux", target_os = "android")) {
            Self::Inotify
        } else if cfg!(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
        )) {
            Self::Kqueue
        } else {
            Self::Poll
        }
    }

    /// Returns `true` if this backend can be constructed on this platform.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        match self {
            Self::Kqueue => cfg!(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "openbsd",
                target_os = "netbsd",
            )),
            Self::Inotify => cfg!(any(target_os = "linux", target_os = "android")),
            Self::Poll => true,
        }
    }

    /// Short lowercase name, as used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Kqueue => "kqueue",
            Self::Inotify => "inotify",
            Self::Poll => "poll",
        }
    }

    /// Returns `true` if a kernel event of `kind` means the file grew or was written.
    ///
    /// kqueue only reports `NOTE_WRITE`/`NOTE_EXTEND` as data changes;
    /// inotify's `IN_MODIFY` may also surface as an unspecified modify.
    /// The polling backend never sees kernel events.
    #[must_use]
    pub const fn accepts(self, kind: &EventKind) -> bool {
        match self {
            Self::Kqueue => matches!(kind, EventKind::Modify(ModifyKind::Data(_))),
            Self::Inotify => matches!(
                kind,
                EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
            ),
            Self::Poll => false,
        }
    }

    /// Returns `true` if `event` should wake a waiting session.
    ///
    /// A rescan flag means the kernel queue overflowed and events were
    /// dropped, so it counts as a change whatever its kind.
    #[must_use]
    pub fn signals_change(self, event: &notify::Event) -> bool {
        event.need_rescan() || self.accepts(&event.kind)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
