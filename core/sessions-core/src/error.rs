//! Error types for sessions-core operations.
//!
//! Failures are contained at the boundary where they occur: a bad status
//! file is skipped, a missing index degrades to empty metadata, and only a
//! failure to list the watch directory itself aborts a scan cycle.

use std::path::PathBuf;

/// All errors that can occur in sessions-core operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionsError {
    // ─────────────────────────────────────────────────────────────────────
    // Discovery Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Session directory unavailable: {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed status file: {path}: {details}")]
    MalformedStatusFile { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Watch & Mutation Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Failed to delete status file: {path}: {source}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory watch setup failed: {path}: {details}")]
    WatchSetupFailed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using SessionsError.
pub type Result<T> = std::result::Result<T, SessionsError>;
