//! One full scan cycle: list, parse, resolve, sort.
//!
//! The session set is rebuilt from scratch on every scan. A file that fails
//! to read or parse is logged and skipped; only a failure to list the watch
//! directory itself is an error, in which case the caller keeps its
//! previously published list for the cycle.

use std::path::{Path, PathBuf};

use chrono::Utc;
use fs_err as fs;
use tracing::warn;

use crate::config::WatchConfig;
use crate::error::{Result, SessionsError};
use crate::index::IndexCache;
use crate::statusline::parse_status_file;
use crate::types::Session;

pub const STATUS_FILE_PREFIX: &str = "claude-status-";

/// Builds the status-file name for a working directory. This is also the
/// deletion key used by remove.
pub fn status_file_name(cwd: &str) -> String {
    format!("{}{}.json", STATUS_FILE_PREFIX, cwd.replace('/', "-"))
}

fn is_status_file(name: &str) -> bool {
    name.starts_with(STATUS_FILE_PREFIX) && name.ends_with(".json")
}

/// Deletes the backing status file for a working directory.
pub fn remove_status_file(dir: &Path, cwd: &str) -> Result<()> {
    let path = dir.join(status_file_name(cwd));
    fs::remove_file(&path).map_err(|source| SessionsError::DeleteFailed { path, source })
}

/// Lists the watch directory and rebuilds the full session set, sorted for
/// publication.
pub fn scan_sessions(dir: &Path, config: &WatchConfig) -> Result<Vec<Session>> {
    let entries = fs::read_dir(dir).map_err(|source| SessionsError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    })?;

    // The index cache lives for exactly this scan.
    let mut index_cache = IndexCache::new();
    let mut sessions = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !is_status_file(name) {
            continue;
        }

        match load_session(&entry.path(), &mut index_cache) {
            Ok(session) => sessions.push(session),
            // Expected during races: the external CLI rewrites and deletes
            // these files while we scan.
            Err(err) => warn!(error = %err, "Skipping status file"),
        }
    }

    sort_sessions(&mut sessions, config);
    Ok(sessions)
}

fn load_session(path: &PathBuf, index_cache: &mut IndexCache) -> Result<Session> {
    let bytes = fs::read(path).map_err(|source| SessionsError::Io {
        context: format!("reading {}", path.display()),
        source,
    })?;
    let mut session = parse_status_file(path, &bytes)?;

    let resolved = index_cache.resolve(Path::new(&session.project_dir), &session.session_id);
    session.display_name = resolved.name;
    session.first_prompt = resolved.first_prompt;
    Ok(session)
}

/// Sorts active sessions first, then idle, then closed; most recently
/// updated first within a tier. Status is evaluated against a single `now`
/// so the ordering is consistent across the whole list.
pub fn sort_sessions(sessions: &mut [Session], config: &WatchConfig) {
    let thresholds = config.thresholds();
    let now = Utc::now();
    sessions.sort_by(|a, b| {
        let a_priority = a.status(now, &thresholds).priority();
        let b_priority = b.status(now, &thresholds).priority();
        a_priority
            .cmp(&b_priority)
            .then_with(|| b.last_update_time.cmp(&a.last_update_time))
    });
}
