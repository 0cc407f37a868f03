#![deny(missing_docs)]
//! Shared logging utilities for the crawl sink workspace.
//!
//! Provides the `sink_*` logging macros used across the codebase, logger
//! initialization for the binary, and a test initializer.
//!
//! Diagnostics never go to stdout: stdout carries the result stream. Only
//! records from the workspace's own crates are kept, so HTTP client internals
//! stay quiet even at trace level.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::{LevelFilter, SetLoggerError};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use thiserror::Error;

// Module-path prefixes of the crates whose records are kept.
const OWN_TARGETS: [&str; 2] = ["crawl_", "sink_logging"];

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! sink_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! sink_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! sink_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! sink_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! sink_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for diagnostic log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given log file only.
    File(PathBuf),
    /// Write to the terminal (stderr).
    Terminal,
    /// Write to both the terminal and the given log file.
    Both(PathBuf),
}

impl LogDestination {
    fn to_terminal(&self) -> bool {
        matches!(self, Self::Terminal | Self::Both(_))
    }

    fn log_file(&self) -> Option<&Path> {
        match self {
            Self::File(path) | Self::Both(path) => Some(path),
            Self::Terminal => None,
        }
    }
}

/// Reasons the global logger could not be installed.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be created.
    #[error("could not create log file {path:?}: {source}")]
    LogFile {
        /// Requested log file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// Another global logger is already installed.
    #[error(transparent)]
    AlreadySet(#[from] SetLoggerError),
}

/// Install the global logger for `destination` at `level`.
pub fn initialize(destination: &LogDestination, level: LevelFilter) -> Result<(), LoggingError> {
    CombinedLogger::init(loggers(destination, level)?)?;
    Ok(())
}

/// Install a stderr logger at debug level for tests.
///
/// Repeated calls, or calls after another logger was installed, are ignored.
pub fn initialize_for_tests() {
    let _ = initialize(&LogDestination::Terminal, LevelFilter::Debug);
}

fn loggers(
    destination: &LogDestination,
    level: LevelFilter,
) -> Result<Vec<Box<dyn SharedLogger>>, LoggingError> {
    let config = log_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);
    if destination.to_terminal() {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if let Some(path) = destination.log_file() {
        let file = File::create(path).map_err(|source| LoggingError::LogFile {
            path: path.to_path_buf(),
            source,
        })?;
        loggers.push(WriteLogger::new(level, config, file));
    }
    Ok(loggers)
}

fn log_config() -> Config {
    let mut builder = ConfigBuilder::new();
    builder
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Trace);
    for target in OWN_TARGETS {
        builder.add_filter_allow_str(target);
    }
    builder.build()
}
