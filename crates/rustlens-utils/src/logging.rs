//! # Logging Utilities
//!
//! Logging infrastructure for RustLens using `tracing`.
//!
//! This module provides structured logging with support for:
//! - Multiple output formats (JSON for production, pretty for development)
//! - Environment variable configuration
//! - Log level filtering
//! - File and console output
//! - Structured fields and spans
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rustlens_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! init_logging().expect("Failed to initialize logging");
//!
//! // Use tracing macros throughout your code
//! tracing::info!("Formatter library loaded");
//! tracing::debug!("Debug information");
//! tracing::error!("An error occurred");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=rustlens_core=debug`)
//! - `RUSTLENS_LOG_FORMAT`: Set output format (`json` or `pretty`, default: `pretty`)
//! - `RUSTLENS_LOG_FILE`: Optional path to log file (if not set, logs only to console)
//!
//! ## Logging inside a debugger host
//!
//! When the library runs embedded in a debugger, anything written to stdout or
//! stderr ends up interleaved with the debugger's own console. Use
//! [`init_file_logging`] in that situation so diagnostic traces go to a file
//! and the host console stays clean.

use std::path::PathBuf;
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default for development)
    Pretty,
    /// JSON format (default for production)
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `rustlens_core=debug`)
/// - `RUSTLENS_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `RUSTLENS_LOG_FILE`: Optional path to log file
///
/// ## Example
///
/// ```rust,no_run
/// use rustlens_utils::init_logging;
///
/// init_logging().expect("Failed to initialize logging");
/// tracing::info!("Formatter library loaded");
/// ```
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - Invalid environment variable values
/// - File logging fails (if `RUSTLENS_LOG_FILE` is set)
pub fn init_logging() -> Result<(), LoggingError>
{
    // Read format from environment or default to pretty
    let format = env::var("RUSTLENS_LOG_FORMAT")
        .ok()
        .and_then(|s| LogFormat::from_str(&s).ok())
        .unwrap_or(LogFormat::Pretty);

    // Read log level from RUST_LOG or default to INFO
    let default_level = env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse::<LogLevel>()
        .map(Into::into)
        .unwrap_or(Level::INFO);

    init_logging_internal(format, default_level)
}

/// Initialize logging with explicit level and format
///
/// ## Example
///
/// ```rust,no_run
/// use rustlens_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_internal(format, level.into())
}

/// Initialize file-only logging (no stdout)
///
/// This function configures logging to write only to a file, not to stdout/stderr.
/// Use it when RustLens is loaded inside a debugger host: log lines written to the
/// standard streams would otherwise corrupt the host's interactive console.
///
/// The log file will be created in the user's home directory at
/// `~/.rustlens/YYYY-MM-DD-rustlens.log` or falls back to
/// `/tmp/YYYY-MM-DD-rustlens.log` if the home directory is not accessible.
///
/// ## Arguments
///
/// * `level` - Optional log level. If `None`, uses `RUST_LOG` environment variable or defaults to `INFO`.
///
/// ## Example
///
/// ```rust,no_run
/// use rustlens_utils::{LogLevel, init_file_logging};
///
/// // Use default (INFO or RUST_LOG)
/// init_file_logging(None).expect("Failed to initialize file logging");
///
/// // Or specify a level explicitly
/// init_file_logging(Some(LogLevel::Debug)).expect("Failed to initialize file logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file creation fails.
pub fn init_file_logging(level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    // Determine log file path with date prefix
    let today = Utc::now().format("%Y-%m-%d");
    let log_file = if let Ok(home) = env::var("HOME") {
        let lens_dir = PathBuf::from(home).join(".rustlens");
        // Create directory if it doesn't exist
        std::fs::create_dir_all(&lens_dir).map_err(LoggingError::FileError)?;
        lens_dir.join(format!("{today}-rustlens.log"))
    } else {
        PathBuf::from("/tmp").join(format!("{today}-rustlens.log"))
    };

    let explicit_level = level.map(Into::into);
    init_logging_file_only(log_file.clone(), LogFormat::Pretty, explicit_level)?;
    Ok(log_file)
}

/// Internal initialization function
#[allow(clippy::unnecessary_wraps)]
fn init_logging_internal(format: LogFormat, default_level: Level) -> Result<(), LoggingError>
{
    // Build environment filter
    // RUST_LOG can override the default level with more specific filters
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    // Check if file logging is requested
    let log_file = env::var("RUSTLENS_LOG_FILE").ok().map(PathBuf::from);

    match format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_writer(io::stdout)
                .with_filter(env_filter.clone());

            if let Some(file_path) = log_file {
                // File logging with pretty format
                let file_appender = tracing_appender::rolling::daily(
                    file_path.parent().unwrap_or(&PathBuf::from(".")),
                    file_path.file_name().unwrap_or_default(),
                );
                let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false) // No ANSI in files
                    .with_filter(env_filter);

                Registry::default().with(console_layer).with(file_layer).init();
            } else {
                // Console only
                Registry::default().with(console_layer).init();
            }
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stdout)
                .with_filter(env_filter.clone());

            if let Some(file_path) = log_file {
                // File logging with JSON format
                let file_appender = tracing_appender::rolling::daily(
                    file_path.parent().unwrap_or(&PathBuf::from(".")),
                    file_path.file_name().unwrap_or_default(),
                );
                let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(env_filter);

                Registry::default().with(console_layer).with(file_layer).init();
            } else {
                // Console only
                Registry::default().with(console_layer).init();
            }
        }
    }

    Ok(())
}

/// Internal initialization function for file-only logging
/// Used inside debugger hosts to prevent stdout interference
#[allow(clippy::unnecessary_wraps)]
fn init_logging_file_only(log_file: PathBuf, format: LogFormat, explicit_level: Option<Level>) -> Result<(), LoggingError>
{
    // Build environment filter
    // Priority:
    // 1. If explicit_level is Some, use it
    // 2. If RUST_LOG is set, use it (allows module-specific filters like "rustlens_core=debug")
    // 3. Otherwise, use INFO as default
    let env_filter = if let Some(level) = explicit_level {
        // Explicit level takes precedence
        EnvFilter::new(level.to_string())
    } else if let Ok(rust_log) = env::var("RUST_LOG") {
        // Use RUST_LOG (supports both simple levels and module-specific filters)
        EnvFilter::try_new(&rust_log).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    } else {
        // Default to INFO
        EnvFilter::new(Level::INFO.to_string())
    };

    match format {
        LogFormat::Pretty => {
            // File logging only with pretty format
            // Use rolling::never() since we're already including the date in the filename
            let file_appender = tracing_appender::rolling::never(
                log_file.parent().unwrap_or(&PathBuf::from(".")),
                log_file.file_name().unwrap_or_default(),
            );
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            // Store the guard to prevent it from being dropped
            std::mem::forget(_guard);

            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false) // No ANSI in files
                .with_filter(env_filter);

            Registry::default().with(file_layer).init();
        }
        LogFormat::Json => {
            // File logging only with JSON format
            // Use rolling::never() since we're already including the date in the filename
            let file_appender = tracing_appender::rolling::never(
                log_file.parent().unwrap_or(&PathBuf::from(".")),
                log_file.file_name().unwrap_or_default(),
            );
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            // Store the guard to prevent it from being dropped
            std::mem::forget(_guard);

            let file_layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_filter(env_filter);

            Registry::default().with(file_layer).init();
        }
    }

    Ok(())
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
