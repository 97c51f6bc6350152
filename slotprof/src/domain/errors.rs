//! Structured error types for slotprof
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::ProfilerKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the profiler controllers and the filter entry point.
///
/// Every one of these is caller misuse or a configuration problem; a call
/// that fails leaves the profiler exactly as it was.
#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("{0} profiler is already running")]
    AlreadyRunning(ProfilerKind),

    #[error("{0} profiler is not running")]
    NotRunning(ProfilerKind),

    #[error("Invalid type of profiler filter pattern: expected string or null, got {0}")]
    InvalidFilterType(String),

    #[error("Sample interval must be a positive number of milliseconds, got {0}")]
    InvalidInterval(u64),

    #[error("Slot heap size must be at least 1")]
    ZeroCapacity,

    #[error("Maximum stack depth must be at least 1")]
    ZeroStackDepth,

    #[error("Failed to install sampling trigger: {0}")]
    TriggerInstallFailed(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Profiler(#[from] ProfilerError),
}
