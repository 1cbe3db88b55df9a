//! The tail session: window print followed by the optional follow loop.
//!
//! ```text
//! Init ─► Opened ─► WindowPrinted ─┬─────────────────────────────► Closed
//!                                  │ follow                          ▲
//!                                  ▼                                 │ stop
//!                              Watching ─► Reopening ─► Streaming ───┤
//!                                  ▲                        │        │
//!                                  └────────────────────────┘        │
//!                                  └─────────────────────────────────┘
//! ```
//!
//! Every transition is logged at `trace` level.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom, Write};

use camino::Utf8PathBuf;
use kt_core::{ShutdownFlag, TailConfig};
use kt_scanner::{LineRing, LineScanner};
use kt_watcher::{Backend, ChangeWatcher};
use serde::Serialize;

use crate::error::TailError;

/// Where a [`TailSession`] currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Ring allocated, nothing opened yet.
    Init,
    /// File open for the initial scan.
    Opened,
    /// The last-N window has been written.
    WindowPrinted,
    /// Blocked on the change watcher.
    Watching,
    /// Reopening and repositioning after a change.
    Reopening,
    /// Copying newly appended bytes to the output.
    Streaming,
    /// Finished; the watcher and file are released.
    Closed,
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// File that was tailed.
    pub path: Utf8PathBuf,
    /// Complete lines seen by the bounded scan.
    pub lines_seen: u64,
    /// Bytes consumed from the file, initial scan and streaming together.
    pub bytes_consumed: u64,
    /// Lines cut at the line limit.
    pub truncated_lines: u64,
    /// Whether follow mode ran.
    pub followed: bool,
    /// Change backend used in follow mode.
    pub backend: Option<Backend>,
    /// Number of detected changes that were handled.
    pub changes: u64,
}

/// One `tail` invocation on one file.
///
/// The session owns its output sink. It writes the window once and, in
/// follow mode, streams appended bytes until the shared [`ShutdownFlag`]
/// is raised.
///
/// # Examples
///
/// ```no_run
/// use kt_core::{ShutdownFlag, TailConfig};
/// use kt_session::TailSession;
///
/// let config = TailConfig::new("/var/log/syslog");
/// let stdout = std::io::stdout();
/// let mut session = TailSession::new(config, ShutdownFlag::new(), stdout.lock());
/// let summary = session.run()?;
/// println!("{} lines", summary.lines_seen);
/// # Ok::<(), kt_session::TailError>(())
/// ```
#[derive(Debug)]
pub struct TailSession<W: Write> {
    config: TailConfig,
    backend: Backend,
    shutdown: ShutdownFlag,
    out: W,
    ring: LineRing,
    scanner: LineScanner,
    state: SessionState,
    changes: u64,
    followed: bool,
    opened_len: u64,
}

impl<W: Write> TailSession<W> {
    /// Creates a session using the platform's default change backend.
    #[must_use]
    pub fn new(config: TailConfig, shutdown: ShutdownFlag, out: W) -> Self {
        let ring = LineRing::from_config(&config);
        Self {
            config,
            backend: Backend::platform_default(),
            shutdown,
            out,
            ring,
            scanner: LineScanner::new(),
            state: SessionState::Init,
            changes: 0,
            followed: false,
            opened_len: 0,
        }
    }

    /// Overrides the change backend used in follow mode.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Output sink.
    #[inline]
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Consumes the session and returns its output sink.
    #[must_use]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs the session to completion.
    ///
    /// Prints the last `lines` lines of the file and, with `follow` set,
    /// keeps streaming appended bytes until a stop is requested. A stop
    /// request is a normal exit.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::Config`] if the configuration is invalid (no
    /// output has been produced in that case) and the other variants for
    /// I/O or watcher failures along the way.
    pub fn run(&mut self) -> Result<SessionSummary, TailError> {
        self.config.validate()?;

        let file = self.open()?;
        let file = self.print_window(file)?;

        if self.config.follow {
            self.followed = true;
            self.follow(file)?;
        } else {
            drop(file);
        }

        self.transition(SessionState::Closed);
        Ok(self.summary())
    }

    /// Snapshot of what the session has done so far.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let scan = self.scanner.state();
        SessionSummary {
            path: self.config.path().to_owned(),
            lines_seen: self.ring.line_counter(),
            bytes_consumed: scan.bytes_consumed,
            truncated_lines: scan.truncated_lines,
            followed: self.followed,
            backend: self.followed.then_some(self.backend),
            changes: self.changes,
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    fn open(&mut self) -> Result<BufReader<File>, TailError> {
        let path = self.config.path();
        let file = File::open(path).map_err(|e| TailError::open(path.to_owned(), e))?;
        self.opened_len = file
            .metadata()
            .map_err(|e| TailError::open(path.to_owned(), e))?
            .len();
        tracing::debug!(path = %path, lines = self.ring.capacity(), "opened");
        self.transition(SessionState::Opened);
        Ok(BufReader::new(file))
    }

    fn print_window(&mut self, mut file: BufReader<File>) -> Result<BufReader<File>, TailError> {
        self.scanner.read(&mut file, &mut self.ring)?;

        for line in self.ring.window() {
            self.out.write_all(line).map_err(TailError::Output)?;
            self.out.write_all(b"\n").map_err(TailError::Output)?;
        }
        self.out.flush().map_err(TailError::Output)?;

        tracing::debug!(
            lines = self.ring.len(),
            offset = self.scanner.bytes_consumed(),
            "window printed"
        );
        self.transition(SessionState::WindowPrinted);
        Ok(file)
    }

    fn follow(&mut self, file: BufReader<File>) -> Result<(), TailError> {
        let mut watcher = ChangeWatcher::new(
            self.backend,
            self.config.path(),
            &self.config.watch,
            self.shutdown.clone(),
        )?;
        tracing::info!(path = %self.config.path(), backend = %watcher.backend(), "following");

        let result = self.follow_loop(&mut watcher, file);
        watcher.close();
        result
    }

    fn follow_loop(
        &mut self,
        watcher: &mut ChangeWatcher,
        mut file: BufReader<File>,
    ) -> Result<(), TailError> {
        // Changes that landed between the initial scan and the watch
        // registration produce no event. A size below the offset only counts
        // if it moved since the open: procfs files report 0 throughout.
        let consumed = self.scanner.bytes_consumed();
        let missed = self.config.path().metadata().is_ok_and(|m| {
            m.len() > consumed || (m.len() < consumed && m.len() != self.opened_len)
        });
        if missed {
            file = self.stream_change(file)?;
        }

        while !self.shutdown.is_requested() {
            self.transition(SessionState::Watching);
            if watcher.wait(self.scanner.bytes_consumed())?.is_changed() {
                file = self.stream_change(file)?;
            }
        }

        tracing::debug!(changes = self.changes, "stop requested");
        Ok(())
    }

    /// Reopens the file, repositions at the consumed offset and streams
    /// whatever follows it.
    fn stream_change(&mut self, file: BufReader<File>) -> Result<BufReader<File>, TailError> {
        self.changes += 1;
        self.transition(SessionState::Reopening);

        let mut file = self.reopen(file)?;

        self.transition(SessionState::Streaming);
        let copied = self.scanner.read_and_print(&mut file, &mut self.out)?;
        tracing::trace!(bytes = copied, offset = self.scanner.bytes_consumed(), "streamed");
        Ok(file)
    }

    fn reopen(&mut self, current: BufReader<File>) -> Result<BufReader<File>, TailError> {
        drop(current);

        let path = self.config.path();
        let mut file = File::open(path).map_err(|e| TailError::reopen(path.to_owned(), e))?;
        let len = file
            .metadata()
            .map_err(|e| TailError::reopen(path.to_owned(), e))?
            .len();

        if len < self.scanner.bytes_consumed() {
            tracing::warn!(
                path = %path,
                len,
                offset = self.scanner.bytes_consumed(),
                "file truncated, streaming from the start"
            );
            self.scanner.rewind();
        }

        let offset = self.scanner.bytes_consumed();
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| TailError::Seek { offset, source })?;
        Ok(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, OpenOptions};
    use std::num::NonZeroUsize;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use kt_core::WatchConfig;
    use tempfile::TempDir;

    /// Output sink shared with the test thread while a session runs.
    #[derive(Debug, Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }

        fn wait_for(&self, expected: &[u8]) -> Vec<u8> {
            let deadline = Instant::now() + Duration::from_secs(10);
            loop {
                let current = self.contents();
                if current == expected || Instant::now() > deadline {
                    return current;
                }
                thread::sleep(Duration::from_millis(20));
            }
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn fixture(contents: &[u8]) -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("app.log")).unwrap();
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    fn config(path: &Utf8PathBuf, lines: usize) -> TailConfig {
        TailConfig::new(path.clone())
            .with_lines(NonZeroUsize::new(lines).unwrap())
            .with_watch(WatchConfig {
                poll_interval_ms: 20,
                shutdown_check_ms: 20,
            })
    }

    fn tail(config: TailConfig) -> (SessionSummary, Vec<u8>) {
        let mut session = TailSession::new(config, ShutdownFlag::new(), Vec::new());
        let summary = session.run().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        (summary, session.into_output())
    }

    fn append(path: &Utf8PathBuf, bytes: &[u8]) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
    }

    /// Runs a follow session on its own thread, returning the shared
    /// output, the stop flag and the join handle.
    fn spawn_follow(
        config: TailConfig,
        backend: Backend,
    ) -> (
        SharedBuf,
        ShutdownFlag,
        thread::JoinHandle<Result<SessionSummary, TailError>>,
    ) {
        let out = SharedBuf::default();
        let shutdown = ShutdownFlag::new();
        let mut session = TailSession::new(config.with_follow(true), shutdown.clone(), out.clone())
            .with_backend(backend);
        let handle = thread::spawn(move || session.run());
        (out, shutdown, handle)
    }

    #[test]
    fn test_window_keeps_last_lines() {
        let (_dir, path) = fixture(b"a\nb\nc\nd\ne\n");
        let (summary, out) = tail(config(&path, 3));
        assert_eq!(out, b"c\nd\ne\n");
        assert_eq!(summary.lines_seen, 5);
        assert_eq!(summary.bytes_consumed, 10);
        assert!(!summary.followed);
        assert_eq!(summary.backend, None);
    }

    #[test]
    fn test_window_shorter_file_prints_everything() {
        let (_dir, path) = fixture(b"x\ny\n");
        let (_, out) = tail(config(&path, 5));
        assert_eq!(out, b"x\ny\n");
    }

    #[test]
    fn test_window_empty_file() {
        let (_dir, path) = fixture(b"");
        let (summary, out) = tail(config(&path, 10));
        assert!(out.is_empty());
        assert_eq!(summary.lines_seen, 0);
        assert_eq!(summary.bytes_consumed, 0);
    }

    #[test]
    fn test_window_unterminated_last_line_gets_newline() {
        let (_dir, path) = fixture(b"one\ntwo\nthree");
        let (summary, out) = tail(config(&path, 2));
        assert_eq!(out, b"two\nthree\n");
        assert_eq!(summary.bytes_consumed, 13);
    }

    #[test]
    fn test_window_is_idempotent() {
        let (_dir, path) = fixture(b"1\n2\n3\n4\n");
        let (_, first) = tail(config(&path, 2));
        let (_, second) = tail(config(&path, 2));
        assert_eq!(first, second);
        assert_eq!(first, b"3\n4\n");
    }

    #[test]
    fn test_window_truncates_overlong_lines() {
        let (_dir, path) = fixture(b"short\nabcdefghij\nend\n");
        let (summary, out) = tail(config(&path, 3).with_max_line(5));
        assert_eq!(out, b"shor\nabcd\nend\n");
        assert_eq!(summary.truncated_lines, 2);
        assert_eq!(summary.bytes_consumed, 21);
    }

    #[test]
    fn test_window_snapshot_with_truncation() {
        let (_dir, path) = fixture(b"first\nsecond line that is long\nthird\n");
        let (_, out) = tail(config(&path, 2).with_max_line(7));
        let text = String::from_utf8(out).unwrap();

        insta::assert_snapshot!(text.trim_end(), @r"
        second
        third
        ");
    }

    #[test]
    fn test_run_rejects_missing_file_without_output() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.log")).unwrap();
        let mut session = TailSession::new(config(&path, 3), ShutdownFlag::new(), Vec::new());

        let err = session.run().unwrap_err();
        assert!(err.is_precondition());
        assert!(session.output().is_empty());
        assert_eq!(session.state(), SessionState::Init);
    }

    #[test]
    fn test_run_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let mut session = TailSession::new(config(&path, 3), ShutdownFlag::new(), Vec::new());

        let err = session.run().unwrap_err();
        assert!(matches!(
            err,
            TailError::Config(kt_core::ConfigError::NotRegularFile(_))
        ));
    }

    #[test]
    fn test_output_failure_is_reported() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let (_dir, path) = fixture(b"a\n");
        let mut session = TailSession::new(config(&path, 3), ShutdownFlag::new(), Closed);
        let err = session.run().unwrap_err();
        assert!(matches!(err, TailError::Output(_)));
    }

    #[test]
    fn test_follow_streams_appended_lines_with_polling() {
        let (_dir, path) = fixture(b"a\nb\nc\nd\ne\n");
        let (out, shutdown, handle) = spawn_follow(config(&path, 3), Backend::Poll);

        assert_eq!(out.wait_for(b"c\nd\ne\n"), b"c\nd\ne\n");
        append(&path, b"f\n");
        assert_eq!(out.wait_for(b"c\nd\ne\nf\n"), b"c\nd\ne\nf\n");

        shutdown.request();
        let summary = handle.join().unwrap().unwrap();
        assert!(summary.followed);
        assert_eq!(summary.backend, Some(Backend::Poll));
        assert_eq!(summary.bytes_consumed, 12);
        assert!(summary.changes >= 1);
    }

    #[test]
    fn test_follow_streams_partial_writes_verbatim() {
        let (_dir, path) = fixture(b"start\n");
        let (out, shutdown, handle) = spawn_follow(config(&path, 1), Backend::Poll);

        assert_eq!(out.wait_for(b"start\n"), b"start\n");
        append(&path, b"no newline yet");
        assert_eq!(out.wait_for(b"start\nno newline yet"), b"start\nno newline yet");
        append(&path, b", done\n");
        assert_eq!(
            out.wait_for(b"start\nno newline yet, done\n"),
            b"start\nno newline yet, done\n"
        );

        shutdown.request();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_follow_restarts_after_truncation() {
        let (_dir, path) = fixture(b"a\nb\n");
        let (out, shutdown, handle) = spawn_follow(config(&path, 10), Backend::Poll);

        assert_eq!(out.wait_for(b"a\nb\n"), b"a\nb\n");
        fs::write(&path, b"z\n").unwrap();
        assert_eq!(out.wait_for(b"a\nb\nz\n"), b"a\nb\nz\n");

        shutdown.request();
        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.bytes_consumed, 2);
    }

    #[test]
    fn test_follow_picks_up_replaced_file() {
        let (dir, path) = fixture(b"a\nb\n");
        let staged = dir.path().join("app.log.new");
        let (out, shutdown, handle) = spawn_follow(config(&path, 10), Backend::Poll);
        assert_eq!(out.wait_for(b"a\nb\n"), b"a\nb\n");

        // A longer replacement continues from the consumed offset.
        fs::write(&staged, b"a\nb\nc\n").unwrap();
        fs::rename(&staged, &path).unwrap();
        assert_eq!(out.wait_for(b"a\nb\nc\n"), b"a\nb\nc\n");

        // A shorter one is streamed from its start.
        fs::write(&staged, b"x\n").unwrap();
        fs::rename(&staged, &path).unwrap();
        assert_eq!(out.wait_for(b"a\nb\nc\nx\n"), b"a\nb\nc\nx\n");

        shutdown.request();
        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.bytes_consumed, 2);
        assert!(summary.changes >= 2);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_follow_procfs_file_prints_once() {
        let path = Utf8PathBuf::from("/proc/version");
        let contents = fs::read(&path).unwrap();
        let (out, shutdown, handle) = spawn_follow(config(&path, 1), Backend::Poll);

        assert_eq!(out.wait_for(&contents), contents);
        thread::sleep(Duration::from_millis(150));
        shutdown.request();

        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.changes, 0);
        assert_eq!(out.contents(), contents);
    }

    #[test]
    fn test_follow_stop_without_changes() {
        let (_dir, path) = fixture(b"quiet\n");
        let (out, shutdown, handle) =
            spawn_follow(config(&path, 5), Backend::platform_default());

        assert_eq!(out.wait_for(b"quiet\n"), b"quiet\n");
        thread::sleep(Duration::from_millis(100));
        shutdown.request();

        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.changes, 0);
        assert_eq!(out.contents(), b"quiet\n");
    }

    #[test]
    fn test_follow_stop_requested_before_start() {
        let (_dir, path) = fixture(b"a\n");
        let shutdown = ShutdownFlag::new();
        shutdown.request();

        let mut session = TailSession::new(
            config(&path, 5).with_follow(true),
            shutdown,
            Vec::new(),
        )
        .with_backend(Backend::Poll);
        let summary = session.run().unwrap();

        assert!(summary.followed);
        assert_eq!(session.into_output(), b"a\n");
    }

    #[test]
    fn test_follow_output_matches_across_backends() {
        let mut outputs = Vec::new();
        for backend in [Backend::Poll, Backend::platform_default()] {
            let (_dir, path) = fixture(b"a\nb\nc\nd\ne\n");
            let (out, shutdown, handle) = spawn_follow(config(&path, 3), backend);

            out.wait_for(b"c\nd\ne\n");
            // Give the kernel watch time to register.
            thread::sleep(Duration::from_millis(200));
            append(&path, b"f\n");
            out.wait_for(b"c\nd\ne\nf\n");

            shutdown.request();
            handle.join().unwrap().unwrap();
            outputs.push(out.contents());
        }

        assert_eq!(outputs[0], b"c\nd\ne\nf\n");
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn test_unsupported_backend_fails_follow() {
        let unsupported = [Backend::Kqueue, Backend::Inotify]
            .into_iter()
            .find(|b| !b.is_supported());
        let Some(backend) = unsupported else {
            return;
        };

        let (_dir, path) = fixture(b"a\n");
        let mut session = TailSession::new(
            config(&path, 5).with_follow(true),
            ShutdownFlag::new(),
            Vec::new(),
        )
        .with_backend(backend);

        let err = session.run().unwrap_err();
        assert!(matches!(err, TailError::Watch(_)));
        // The window is still printed before the watcher is created.
        assert_eq!(session.into_output(), b"a\n");
    }

    #[test]
    fn test_summary_serializes() {
        let (_dir, path) = fixture(b"a\n");
        let (summary, _) = tail(config(&path, 1));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["lines_seen"], 1);
        assert_eq!(json["followed"], false);
        assert!(json["backend"].is_null());
    }
}
