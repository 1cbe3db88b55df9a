//! Configuration structures for the ktail tool.
//!
//! This module provides configuration types for all components of the application:
//!
//! - [`WatchConfig`] - Change watcher timing (poll interval, stop-flag checks)
//! - [`TailConfig`] - Root configuration: target file, window size, follow mode
//!
//! All configuration types implement [`Default`]. A [`TailConfig`] is built
//! once from the command line and handed to the session; nothing reads
//! configuration from global state.

use std::num::NonZeroUsize;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default window size (`-n`).
pub const DEFAULT_LINES: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Fallback per-slot line buffer size: the POSIX minimum `LINE_MAX` plus the
/// terminator slot.
///
/// A stored line holds at most `DEFAULT_MAX_LINE - 1` bytes.
pub const DEFAULT_MAX_LINE: usize = 2048 + 1;

/// Per-slot line buffer size for this host: `sysconf(_SC_LINE_MAX)` plus the
/// terminator slot.
///
/// Falls back to [`DEFAULT_MAX_LINE`] when the limit is indeterminate or the
/// query fails.
#[cfg(unix)]
#[must_use]
pub fn platform_max_line() -> usize {
    use nix::unistd::{SysconfVar, sysconf};

    match sysconf(SysconfVar::LINE_MAX) {
        Ok(Some(limit)) => usize::try_from(limit)
            .ok()
            .filter(|&limit| limit > 0)
            .map_or(DEFAULT_MAX_LINE, |limit| limit.saturating_add(1)),
        Ok(None) | Err(_) => DEFAULT_MAX_LINE,
    }
}

/// Per-slot line buffer size for this host.
#[cfg(not(unix))]
#[must_use]
pub const fn platform_max_line() -> usize {
    DEFAULT_MAX_LINE
}

/// Default sleep between size checks for the polling backend.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default upper bound on how long an event backend blocks before it
/// re-checks the shutdown flag.
pub const DEFAULT_SHUTDOWN_CHECK_MS: u64 = 500;

/// Configuration for the change watcher.
///
/// # Examples
///
/// ```
/// use kt_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.poll_interval_ms, 500);
/// assert_eq!(config.shutdown_check_ms, 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Sleep interval of the polling backend in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum time in milliseconds an event backend blocks on its channel
    /// before looking at the shutdown flag again.
    pub shutdown_check_ms: u64,
}

impl WatchConfig {
    /// Returns the polling interval as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the shutdown check interval as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn shutdown_check(&self) -> Duration {
        Duration::from_millis(self.shutdown_check_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            shutdown_check_ms: DEFAULT_SHUTDOWN_CHECK_MS,
        }
    }
}

/// Root configuration for a tail session.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use kt_core::TailConfig;
///
/// let config = TailConfig::new("/var/log/syslog")
///     .with_lines(NonZeroUsize::new(20).unwrap())
///     .with_follow(true);
///
/// assert_eq!(config.lines.get(), 20);
/// assert!(config.follow);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// File to tail.
    pub path: Utf8PathBuf,

    /// Window size: how many trailing lines to print.
    pub lines: NonZeroUsize,

    /// Keep streaming appended content after printing the window.
    pub follow: bool,

    /// Per-line buffer size. Lines longer than `max_line - 1` bytes are truncated.
    pub max_line: usize,

    /// Change watcher settings used in follow mode.
    pub watch: WatchConfig,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            path: Utf8PathBuf::new(),
            lines: DEFAULT_LINES,
            follow: false,
            max_line: platform_max_line(),
            watch: WatchConfig::default(),
        }
    }
}

impl TailConfig {
    /// Creates a configuration for `path` with default settings.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the window size.
    #[must_use]
    pub const fn with_lines(mut self, lines: NonZeroUsize) -> Self {
        self.lines = lines;
        self
    }

    /// Enables or disables follow mode.
    #[must_use]
    pub const fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Sets the per-line buffer size.
    #[must_use]
    pub const fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Sets the change watcher configuration.
    #[must_use]
    pub const fn with_watch(mut self, watch: WatchConfig) -> Self {
        self.watch = watch;
        self
    }

    /// Checks the preconditions a session relies on.
    ///
    /// The path must resolve (following symlinks) to a regular file, the
    /// line buffer must have room for at least one byte, and the watcher
    /// intervals must be non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPath`] if the path does not exist,
    /// [`ConfigError::Io`] if it cannot be inspected for another reason,
    /// [`ConfigError::NotRegularFile`] if it is a directory, device or socket,
    /// and [`ConfigError::InvalidOption`] for out-of-range settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_str().is_empty() {
            return Err(ConfigError::invalid_path("", "no file given"));
        }

        let metadata = self.path.metadata().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ConfigError::invalid_path(self.path.clone(), e.to_string())
            }
            _ => ConfigError::Io(e),
        })?;
        if !metadata.is_file() {
            return Err(ConfigError::NotRegularFile(self.path.clone()));
        }

        if self.max_line < 2 {
            return Err(ConfigError::invalid_option(
                "max_line",
                "must leave room for at least one byte per line",
            ));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_option(
                "poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.watch.shutdown_check_ms == 0 {
            return Err(ConfigError::invalid_option(
                "shutdown_check_ms",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Returns the target path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Parses a `--number` argument into a positive window size.
///
/// Usable directly as a clap `value_parser`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOption`] for anything that is not a
/// positive decimal integer.
///
/// # Examples
///
/// ```
/// use kt_core::config::parse_line_count;
///
/// assert_eq!(parse_line_count("25").unwrap().get(), 25);
/// assert!(parse_line_count("0").is_err());
/// assert!(parse_line_count("-4").is_err());
/// assert!(parse_line_count("ten").is_err());
/// ```
pub fn parse_line_count(value: &str) -> Result<NonZeroUsize, ConfigError> {
    let n: usize = value
        .parse()
        .map_err(|_| ConfigError::invalid_option("number", format!("'{value}' is not a number")))?;
    NonZeroUsize::new(n)
        .ok_or_else(|| ConfigError::invalid_option("number", "must be a positive integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("temp path is not UTF-8")
    }

    #[test]
    fn test_tail_config_defaults() {
        let config = TailConfig::default();
        assert_eq!(config.lines.get(), 1000);
        assert!(!config.follow);
        assert_eq!(config.max_line, platform_max_line());
        assert_eq!(config.watch, WatchConfig::default());
    }

    #[test]
    fn test_watch_config_durations() {
        let config = WatchConfig {
            poll_interval_ms: 20,
            shutdown_check_ms: 30,
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(20));
        assert_eq!(config.shutdown_check(), Duration::from_millis(30));
    }

    #[test]
    fn test_validate_regular_file() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "hello\n").expect("write");

        assert!(TailConfig::new(utf8(&file)).validate().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_follows_symlinks() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("app.log");
        let link = dir.path().join("current.log");
        fs::write(&file, "hello\n").expect("write");
        std::os::unix::fs::symlink(&file, &link).expect("symlink");

        assert!(TailConfig::new(utf8(&link)).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_directory() {
        let dir = TempDir::new().expect("tempdir");
        let err = TailConfig::new(utf8(dir.path())).validate().unwrap_err();
        assert!(matches!(err, ConfigError::NotRegularFile(_)));
    }

    #[test]
    fn test_validate_rejects_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = TailConfig::new(utf8(&dir.path().join("nope.log")))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_reports_uninspectable_path_as_io() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "hello\n").expect("write");

        // A regular file used as a directory component fails with ENOTDIR.
        let err = TailConfig::new(utf8(&file.join("child.log")))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)), "got {err:?}");
        assert!(err.to_string().starts_with("failed to inspect target"));
    }

    #[test]
    fn test_platform_max_line_leaves_room_for_a_byte() {
        assert!(platform_max_line() >= 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_platform_max_line_on_linux() {
        // glibc and musl both report LINE_MAX as 2048.
        assert_eq!(platform_max_line(), 2048 + 1);
    }

    #[test]
    fn test_validate_rejects_tiny_line_buffer() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "").expect("write");

        let err = TailConfig::new(utf8(&file))
            .with_max_line(1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("app.log");
        fs::write(&file, "").expect("write");

        let err = TailConfig::new(utf8(&file))
            .with_watch(WatchConfig {
                poll_interval_ms: 0,
                ..WatchConfig::default()
            })
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_parse_line_count() {
        assert_eq!(parse_line_count("1").map(NonZeroUsize::get).ok(), Some(1));
        assert_eq!(
            parse_line_count("1000").map(NonZeroUsize::get).ok(),
            Some(1000)
        );
        assert!(parse_line_count("0").is_err());
        assert!(parse_line_count("-1").is_err());
        assert!(parse_line_count("").is_err());
        assert!(parse_line_count("12abc").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = TailConfig::new("/var/log/app.log").with_follow(true);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TailConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"path": "/var/log/app.log", "watch": {"poll_interval_ms": 50}}"#;
        let config: TailConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.path, "/var/log/app.log");
        assert_eq!(config.watch.poll_interval_ms, 50);
        // Other fields should have defaults
        assert_eq!(config.watch.shutdown_check_ms, 500);
        assert_eq!(config.lines.get(), 1000);
    }
}
