//! # sessions-core
//!
//! Discovery and freshness engine for Claude Code session status files.
//!
//! An external CLI writes one small JSON snapshot per working directory into
//! `~/.claude_sessions`. This crate watches that directory, parses every
//! known historical file shape into a normalized [`Session`] record,
//! classifies liveness from elapsed time, and publishes the sorted set to a
//! consumer on another thread.
//!
//! ## Design Principles
//!
//! - **Synchronous**: plain threads and channels, no async runtime.
//! - **Status files are the source of truth**: records are rebuilt from
//!   disk on every scan, never patched in place.
//! - **Graceful degradation**: a bad file is skipped, a missing index means
//!   empty display metadata, a broken directory watch falls back to
//!   interval polling. No single failure stops the scan cycle.
//! - **Explicit wiring**: configuration is injected through a
//!   [`ConfigHandle`]; there is no global state.

pub mod config;
pub mod error;
pub mod index;
pub mod scan;
pub mod status;
pub mod statusline;
pub mod types;
pub mod watcher;

pub use config::{
    default_sessions_dir, load_watch_config, save_watch_config, ConfigHandle, WatchConfig,
};
pub use error::{Result, SessionsError};
pub use scan::{remove_status_file, scan_sessions, sort_sessions, status_file_name};
pub use status::{SessionStatus, Thresholds};
pub use types::{CodeImpact, ContextWindow, Cost, ModelInfo, Session, TokenUsage};
pub use watcher::{SessionWatcher, SessionsSnapshot};
