//! # RustLens Utilities
//!
//! Shared utilities, logging, config, and helpers for RustLens.
//!
//! This crate provides common functionality used across the RustLens workspace,
//! including production-ready logging infrastructure built on `tracing`.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{LogFormat, LogLevel, init_file_logging, init_logging, init_logging_with_level};
pub use tracing::{debug, error, info, trace, warn};
