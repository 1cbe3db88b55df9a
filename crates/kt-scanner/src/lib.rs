//! Bounded line-window tracking and line scanning for ktail.
//!
//! This crate holds the two pieces that turn file bytes into the printed
//! window:
//!
//! - [`LineRing`]: fixed-capacity circular store of the last `N` lines
//! - [`LineScanner`]: reads a stream to end-of-file, either recording lines
//!   into the ring (bounded scan) or copying bytes to an output (streaming
//!   scan)
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//! use kt_scanner::{LineRing, LineScanner};
//!
//! let mut ring = LineRing::new(NonZeroUsize::new(3).unwrap(), 2049);
//! let mut scanner = LineScanner::new();
//!
//! scanner.read(&mut &b"a\nb\nc\nd\ne\n"[..], &mut ring)?;
//! let lines: Vec<&[u8]> = ring.window().collect();
//! assert_eq!(lines, [b"c", b"d", b"e"]);
//!
//! // Content appended later is streamed, not windowed.
//! let mut out = Vec::new();
//! scanner.read_and_print(&mut &b"f\n"[..], &mut out)?;
//! assert_eq!(out, b"f\n");
//! assert_eq!(scanner.bytes_consumed(), 12);
//! # Ok::<(), kt_scanner::ScanError>(())
//! ```
//!
//! # Overlong Lines
//!
//! Lines longer than `max_line - 1` bytes are cut: the prefix is kept, a
//! `tracing` warning is emitted, and everything up to the next newline is
//! skipped. Skipped bytes still count towards the consumed offset.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod ring;
mod scanner;

pub use error::ScanError;
pub use ring::{LineRing, Window};
pub use scanner::{LineScanner, ScanState};
