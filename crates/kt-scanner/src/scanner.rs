//! Line scanner: bounded and streaming passes over a file.
//!
//! [`LineScanner`] owns the [`ScanState`] for a session. It reads whatever
//! the reader yields from its current position up to end-of-file, in one of
//! two modes:
//!
//! - [`read`](LineScanner::read) splits on `\n` and records lines into a
//!   [`LineRing`]; used for the initial window.
//! - [`read_and_print`](LineScanner::read_and_print) copies bytes verbatim to
//!   an output; used for content appended after the window was printed.
//!
//! Both modes count every byte read, including the discarded tail of an
//! overlong line, so `bytes_consumed` is always a valid reseek offset.

use std::io::{self, BufRead, Write};

use serde::Serialize;

use crate::error::ScanError;
use crate::ring::{self, LineRing};

/// Progress counters carried across scans of the same file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanState {
    /// Bytes read from the file so far; the reopen/seek offset.
    pub bytes_consumed: u64,

    /// Lines cut to the line limit so far.
    pub truncated_lines: u64,

    /// Skipping the rest of an overlong line until the next `\n`.
    pub discarding: bool,
}

/// Reads a file stream and feeds a [`LineRing`] or an output.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use kt_scanner::{LineRing, LineScanner};
///
/// let mut ring = LineRing::new(NonZeroUsize::new(2).unwrap(), 64);
/// let mut scanner = LineScanner::new();
///
/// let read = scanner.read(&mut &b"one\ntwo\nthree\n"[..], &mut ring)?;
/// assert_eq!(read, 14);
/// assert_eq!(scanner.state().bytes_consumed, 14);
///
/// let window: Vec<&[u8]> = ring.window().collect();
/// assert_eq!(window, [&b"two"[..], &b"three"[..]]);
/// # Ok::<(), kt_scanner::ScanError>(())
/// ```
#[derive(Debug, Default)]
pub struct LineScanner {
    state: ScanState,
}

impl LineScanner {
    /// Creates a scanner positioned at the start of a file.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current scan counters.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> &ScanState {
        &self.state
    }

    /// Byte offset a reopened file should be seeked to.
    #[inline]
    #[must_use]
    pub const fn bytes_consumed(&self) -> u64 {
        self.state.bytes_consumed
    }

    /// Resets the offset after the file was found shorter than what was read.
    pub fn rewind(&mut self) {
        self.state.bytes_consumed = 0;
        self.state.discarding = false;
    }

    /// Bounded scan: records every line up to end-of-file into `ring`.
    ///
    /// A trailing fragment without a newline stays in the ring as the line
    /// in progress. Returns the number of bytes read by this call.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Read`] if the reader fails. Interrupted reads are
    /// retried.
    pub fn read<R: BufRead + ?Sized>(
        &mut self,
        reader: &mut R,
        ring: &mut LineRing,
    ) -> Result<u64, ScanError> {
        let mut read = 0u64;

        loop {
            let chunk = match reader.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScanError::Read(e)),
            };
            if chunk.is_empty() {
                break;
            }

            let len = chunk.len();
            self.scan_chunk(chunk, ring);
            reader.consume(len);
            read += len as u64;
            self.state.bytes_consumed += len as u64;
        }

        tracing::trace!(
            read,
            lines = ring.line_counter(),
            pending = ring.pending_len(),
            "bounded scan reached end of file"
        );
        Ok(read)
    }

    /// Streaming scan: copies every byte up to end-of-file to `out`.
    ///
    /// No line splitting or truncation is applied. `out` is flushed before
    /// returning. Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Read`] if the reader fails and
    /// [`ScanError::Write`] if the output does.
    pub fn read_and_print<R, W>(&mut self, reader: &mut R, out: &mut W) -> Result<u64, ScanError>
    where
        R: BufRead + ?Sized,
        W: Write + ?Sized,
    {
        let mut copied = 0u64;

        loop {
            let chunk = match reader.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScanError::Read(e)),
            };
            if chunk.is_empty() {
                break;
            }

            out.write_all(chunk).map_err(ScanError::Write)?;
            let len = chunk.len();
            reader.consume(len);
            copied += len as u64;
            self.state.bytes_consumed += len as u64;
        }

        out.flush().map_err(ScanError::Write)?;
        Ok(copied)
    }

    fn scan_chunk(&mut self, mut chunk: &[u8], ring: &mut LineRing) {
        while !chunk.is_empty() {
            let newline = chunk.iter().position(|&b| b == b'\n');
            let segment = newline.map_or(chunk, |i| &chunk[..i]);

            if !self.state.discarding {
                let accepted = ring.extend_pending(segment);
                if accepted < segment.len() {
                    self.state.discarding = true;
                    self.state.truncated_lines += 1;
                    ring::warn_truncated(ring.line_counter(), ring.line_limit());
                }
            }

            match newline {
                Some(i) => {
                    ring.commit_pending();
                    self.state.discarding = false;
                    chunk = &chunk[i + 1..];
                }
                None => break,
            }
        }
    }
}
