//! Fixed-capacity circular store of the most recent lines.
//!
//! [`LineRing`] keeps the last `N` completed lines plus the line currently
//! being assembled. Addressing is purely modular: completed line number `i`
//! (zero-based, counted over the whole file) lives in slot `i % N`. The line
//! in progress is a virtual entry with index `line_counter`, held in a
//! separate buffer until it is committed so the oldest completed line is not
//! clobbered early.
//!
//! ```text
//!   N = 3, lines a..e committed, "f" pending
//!
//!   slots:   [ d ][ e ][ c ]     line_counter = 5
//!              3    4    2       (line index held by each slot)
//!   pending:  "f"                (virtual index 5)
//!
//!   window(): last 3 of [a b c d e f] ──► d, e, f
//! ```

use std::num::NonZeroUsize;

use kt_core::TailConfig;

/// Emits the overlong-line warning.
///
/// `line_index` is the zero-based index of the line being truncated.
pub(crate) fn warn_truncated(line_index: u64, limit: usize) {
    tracing::warn!(
        line = line_index + 1,
        limit,
        "line is too long, cutting it"
    );
}

/// Circular buffer of the last `N` lines of a file.
///
/// Allocated once per session and never resized. Slot buffers are reused
/// across wraparounds.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use kt_scanner::LineRing;
///
/// let mut ring = LineRing::new(NonZeroUsize::new(3).unwrap(), 64);
/// for line in ["a", "b", "c", "d", "e"] {
///     ring.record_line(line.as_bytes());
/// }
///
/// let window: Vec<&[u8]> = ring.window().collect();
/// assert_eq!(window, [b"c", b"d", b"e"]);
/// ```
#[derive(Debug, Clone)]
pub struct LineRing {
    /// Completed lines, addressed by `line_index % capacity`.
    slots: Vec<Vec<u8>>,

    /// Line being assembled; not yet newline-terminated.
    pending: Vec<u8>,

    /// Per-line buffer size; at most `max_line - 1` bytes are stored.
    max_line: usize,

    /// Total number of completed lines ever recorded.
    line_counter: u64,
}

impl LineRing {
    /// Creates a ring holding `capacity` lines of at most `max_line - 1` bytes.
    ///
    /// A `max_line` below 2 is raised to 2 so every slot can hold one byte.
    #[must_use]
    pub fn new(capacity: NonZeroUsize, max_line: usize) -> Self {
        let max_line = max_line.max(2);
        Self {
            slots: vec![Vec::new(); capacity.get()],
            pending: Vec::with_capacity(max_line - 1),
            max_line,
            line_counter: 0,
        }
    }

    /// Creates a ring sized from a session configuration.
    #[must_use]
    pub fn from_config(config: &TailConfig) -> Self {
        Self::new(config.lines, config.max_line)
    }

    /// Number of lines the window holds.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Per-line buffer size this ring was built with.
    #[inline]
    #[must_use]
    pub const fn max_line(&self) -> usize {
        self.max_line
    }

    /// Longest line, in bytes, stored without truncation.
    #[inline]
    #[must_use]
    pub const fn line_limit(&self) -> usize {
        self.max_line - 1
    }

    /// Total number of completed lines recorded so far.
    #[inline]
    #[must_use]
    pub const fn line_counter(&self) -> u64 {
        self.line_counter
    }

    /// Column offset of the line in progress.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of entries [`window`](Self::window) yields.
    #[must_use]
    pub fn len(&self) -> usize {
        let capacity = self.capacity();
        usize::try_from(self.total_entries()).map_or(capacity, |total| total.min(capacity))
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores one complete line, truncating it to the line limit.
    ///
    /// Discards any line in progress. Returns `true` if the line was cut; a
    /// warning is emitted in that case.
    pub fn record_line(&mut self, text: &[u8]) -> bool {
        self.pending.clear();
        let accepted = self.extend_pending(text);
        let truncated = accepted < text.len();
        if truncated {
            warn_truncated(self.line_counter, self.line_limit());
        }
        self.commit_pending();
        truncated
    }

    /// Appends bytes to the line in progress.
    ///
    /// Returns how many bytes fit; the remainder is dropped.
    pub fn extend_pending(&mut self, bytes: &[u8]) -> usize {
        let room = self.line_limit().saturating_sub(self.pending.len());
        let accepted = bytes.len().min(room);
        self.pending.extend_from_slice(&bytes[..accepted]);
        accepted
    }

    /// Completes the line in progress, overwriting the oldest slot.
    pub fn commit_pending(&mut self) {
        let slot = self.slot_index(self.line_counter);
        std::mem::swap(&mut self.slots[slot], &mut self.pending);
        self.pending.clear();
        self.line_counter += 1;
    }

    /// Returns the current window: up to `N` most recent lines, oldest first.
    ///
    /// A non-empty line in progress is included as the final entry.
    #[must_use]
    pub fn window(&self) -> Window<'_> {
        let end = self.total_entries();
        let start = end - self.len() as u64;
        Window {
            ring: self,
            next: start,
            end,
        }
    }

    fn total_entries(&self) -> u64 {
        self.line_counter + u64::from(!self.pending.is_empty())
    }

    // The remainder is below capacity, which is a usize.
    #[allow(clippy::cast_possible_truncation)]
    fn slot_index(&self, line_index: u64) -> usize {
        (line_index % self.capacity() as u64) as usize
    }

    fn entry(&self, line_index: u64) -> &[u8] {
        if line_index == self.line_counter {
            &self.pending
        } else {
            &self.slots[self.slot_index(line_index)]
        }
    }
}

/// Iterator over the lines of a [`LineRing`] window, oldest first.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    ring: &'a LineRing,
    next: u64,
    end: u64,
}

impl<'a> Iterator for Window<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let line = self.ring.entry(self.next);
        self.next += 1;
        Some(line)
    }

    // Never exceeds the ring capacity.
    #[allow(clippy::cast_possible_truncation)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Window<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize, max_line: usize) -> LineRing {
        LineRing::new(NonZeroUsize::new(capacity).unwrap(), max_line)
    }

    fn collect(ring: &LineRing) -> Vec<String> {
        ring.window()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    #[test]
    fn test_empty_ring_has_empty_window() {
        let ring = ring(4, 16);
        assert!(ring.is_empty());
        assert_eq!(ring.window().len(), 0);
    }

    #[test]
    fn test_short_file_no_wraparound() {
        let mut ring = ring(5, 16);
        ring.record_line(b"x");
        ring.record_line(b"y");
        assert_eq!(collect(&ring), ["x", "y"]);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_wraparound_keeps_last_n_in_order() {
        let mut ring = ring(3, 16);
        for line in ["a", "b", "c", "d", "e"] {
            ring.record_line(line.as_bytes());
        }
        assert_eq!(collect(&ring), ["c", "d", "e"]);
        assert_eq!(ring.line_counter(), 5);
    }

    #[test]
    fn test_exactly_capacity_lines() {
        let mut ring = ring(3, 16);
        for line in ["a", "b", "c"] {
            ring.record_line(line.as_bytes());
        }
        assert_eq!(collect(&ring), ["a", "b", "c"]);
    }

    #[test]
    fn test_many_wraps() {
        let mut ring = ring(4, 16);
        for i in 0..1003 {
            ring.record_line(i.to_string().as_bytes());
        }
        assert_eq!(collect(&ring), ["999", "1000", "1001", "1002"]);
    }

    #[test]
    fn test_capacity_one() {
        let mut ring = ring(1, 16);
        ring.record_line(b"first");
        ring.record_line(b"second");
        assert_eq!(collect(&ring), ["second"]);
    }

    #[test]
    fn test_pending_line_is_last_entry() {
        let mut ring = ring(2, 16);
        ring.record_line(b"a");
        ring.record_line(b"b");
        ring.extend_pending(b"c");
        assert_eq!(collect(&ring), ["b", "c"]);
        assert_eq!(ring.pending_len(), 1);
    }

    #[test]
    fn test_pending_line_before_wraparound() {
        let mut ring = ring(5, 16);
        ring.record_line(b"a");
        ring.extend_pending(b"tail");
        assert_eq!(collect(&ring), ["a", "tail"]);
    }

    #[test]
    fn test_empty_lines_are_kept() {
        let mut ring = ring(3, 16);
        ring.record_line(b"");
        ring.record_line(b"a");
        ring.record_line(b"");
        assert_eq!(collect(&ring), ["", "a", ""]);
    }

    #[test]
    fn test_record_line_truncates() {
        let mut ring = ring(2, 5);
        assert!(ring.record_line(b"abcdefgh"));
        assert!(!ring.record_line(b"abcd"));
        assert_eq!(collect(&ring), ["abcd", "abcd"]);
    }

    #[test]
    fn test_line_at_limit_is_not_truncated() {
        let mut ring = ring(2, 5);
        assert!(!ring.record_line(b"wxyz"));
        assert_eq!(ring.window().next(), Some(&b"wxyz"[..]));
    }

    #[test]
    fn test_extend_pending_respects_limit() {
        let mut ring = ring(2, 4);
        assert_eq!(ring.extend_pending(b"ab"), 2);
        assert_eq!(ring.extend_pending(b"cd"), 1);
        assert_eq!(ring.extend_pending(b"e"), 0);
        ring.commit_pending();
        assert_eq!(collect(&ring), ["abc"]);
    }

    #[test]
    fn test_max_line_is_clamped() {
        let ring = ring(1, 0);
        assert_eq!(ring.max_line(), 2);
        assert_eq!(ring.line_limit(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = TailConfig::new("app.log")
            .with_lines(NonZeroUsize::new(7).unwrap())
            .with_max_line(32);
        let ring = LineRing::from_config(&config);
        assert_eq!(ring.capacity(), 7);
        assert_eq!(ring.line_limit(), 31);
    }
}
