//! Core types, errors, and utilities for the ktail tool.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`TailConfig`] and [`WatchConfig`], built once at startup and passed by
//!   value into the session
//! - [`ConfigError`] for validation failures
//! - [`ShutdownFlag`], the stop signal shared between the signal handler and
//!   the follow loop
//!
//! # Crate Dependencies
//!
//! ```text
//! kt-cli ──► kt-session ──► kt-scanner ──► kt-core
//!                      └──► kt-watcher ──► kt-core
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod shutdown;

pub use config::{
    DEFAULT_LINES, DEFAULT_MAX_LINE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SHUTDOWN_CHECK_MS,
    TailConfig, WatchConfig, platform_max_line,
};
pub use error::ConfigError;
pub use shutdown::ShutdownFlag;
