//! Status-file decoding.
//!
//! The external CLI rewrites one small JSON document per working directory.
//! The document schema has changed over the file's life and carries no
//! version field, so decoding tries each known shape against the same bytes
//! and detects by field presence. Unknown extra fields are ignored in both
//! shapes; a file matching neither shape is malformed and skipped by the
//! scan, never fatal.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{Result, SessionsError};
use crate::types::{CodeImpact, ContextWindow, Cost, ModelInfo, Session, TokenUsage};

#[derive(Debug, Deserialize)]
struct ModelData {
    display_name: String,
    id: String,
}

/// Current statusline payload: raw token counters nested under
/// `context_window`, cost totals in USD and milliseconds.
#[derive(Debug, Deserialize)]
struct StatuslineDoc {
    session_id: String,
    cwd: String,
    model: ModelData,
    context_window: StatuslineContextWindow,
    cost: StatuslineCost,
    #[serde(rename = "_statusline_update_time")]
    statusline_update_time: i64,
    #[serde(default)]
    transcript_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatuslineContextWindow {
    total_input_tokens: u64,
    total_output_tokens: u64,
    context_window_size: u64,
    #[serde(default)]
    used_percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatuslineCost {
    total_cost_usd: f64,
    total_duration_ms: i64,
    #[serde(default)]
    total_lines_added: Option<u64>,
    #[serde(default)]
    total_lines_removed: Option<u64>,
}

/// Older pre-split snapshot: token usage, context window, cost, and
/// duration already broken out into their own blocks.
#[derive(Debug, Deserialize)]
struct SnapshotDoc {
    session_id: String,
    cwd: String,
    model: ModelData,
    token_usage: SnapshotTokenUsage,
    context_window: SnapshotContextWindow,
    #[serde(default)]
    cost: SnapshotCost,
    #[serde(default)]
    duration: SnapshotDuration,
    #[serde(default)]
    code_impact: Option<SnapshotCodeImpact>,
    last_update_time: i64,
    #[serde(default)]
    transcript_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotTokenUsage {
    input: u64,
    output: u64,
}

#[derive(Debug, Deserialize)]
struct SnapshotContextWindow {
    #[serde(default)]
    used_percentage: Option<f64>,
    max_tokens: u64,
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotCost {
    #[serde(default)]
    total: f64,
    #[serde(default)]
    input: f64,
    #[serde(default)]
    output: f64,
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotDuration {
    #[serde(default)]
    total_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct SnapshotCodeImpact {
    #[serde(default)]
    lines_added: u64,
    #[serde(default)]
    lines_removed: u64,
}

/// Decodes one status file into a normalized session record.
///
/// The current statusline shape is tried first, then the legacy snapshot
/// shape. Display metadata (`display_name`, `first_prompt`) is left empty;
/// the scan fills it in from the session index.
pub fn parse_status_file(path: &Path, bytes: &[u8]) -> Result<Session> {
    match serde_json::from_slice::<StatuslineDoc>(bytes) {
        Ok(doc) => doc.into_session(path),
        Err(primary) => match serde_json::from_slice::<SnapshotDoc>(bytes) {
            Ok(doc) => doc.into_session(path),
            Err(_) => Err(SessionsError::MalformedStatusFile {
                path: path.to_path_buf(),
                details: primary.to_string(),
            }),
        },
    }
}

impl StatuslineDoc {
    fn into_session(self, path: &Path) -> Result<Session> {
        let last_update_time = timestamp_from_millis(path, self.statusline_update_time)?;
        let token_usage = TokenUsage {
            input: self.context_window.total_input_tokens,
            output: self.context_window.total_output_tokens,
        };
        let used_percentage = self.context_window.used_percentage.unwrap_or_else(|| {
            percentage_of(token_usage.total(), self.context_window.context_window_size)
        });
        let code_impact = match (self.cost.total_lines_added, self.cost.total_lines_removed) {
            (None, None) => None,
            (added, removed) => Some(CodeImpact {
                lines_added: added.unwrap_or(0),
                lines_removed: removed.unwrap_or(0),
            }),
        };
        let (project_dir, project_name) =
            derive_project(self.transcript_path.as_deref(), &self.cwd);

        Ok(Session {
            session_id: self.session_id,
            cwd: self.cwd,
            display_name: String::new(),
            first_prompt: String::new(),
            project_dir,
            project_name,
            model: ModelInfo {
                display_name: self.model.display_name,
                id: self.model.id,
            },
            context_window: ContextWindow {
                used_percentage,
                max_tokens: self.context_window.context_window_size,
            },
            token_usage,
            cost: Cost {
                total: self.cost.total_cost_usd,
                input: 0.0,
                output: 0.0,
            },
            duration_secs: self.cost.total_duration_ms as f64 / 1000.0,
            code_impact,
            last_update_time,
        })
    }
}

impl SnapshotDoc {
    fn into_session(self, path: &Path) -> Result<Session> {
        let last_update_time = timestamp_from_millis(path, self.last_update_time)?;
        let token_usage = TokenUsage {
            input: self.token_usage.input,
            output: self.token_usage.output,
        };
        let used_percentage = self
            .context_window
            .used_percentage
            .unwrap_or_else(|| percentage_of(token_usage.total(), self.context_window.max_tokens));
        let (project_dir, project_name) =
            derive_project(self.transcript_path.as_deref(), &self.cwd);

        Ok(Session {
            session_id: self.session_id,
            cwd: self.cwd,
            display_name: String::new(),
            first_prompt: String::new(),
            project_dir,
            project_name,
            model: ModelInfo {
                display_name: self.model.display_name,
                id: self.model.id,
            },
            context_window: ContextWindow {
                used_percentage,
                max_tokens: self.context_window.max_tokens,
            },
            token_usage,
            cost: Cost {
                total: self.cost.total,
                input: self.cost.input,
                output: self.cost.output,
            },
            duration_secs: self.duration.total_seconds,
            code_impact: self.code_impact.map(|impact| CodeImpact {
                lines_added: impact.lines_added,
                lines_removed: impact.lines_removed,
            }),
            last_update_time,
        })
    }
}

/// `max_tokens == 0` yields 0% rather than dividing by zero.
fn percentage_of(total_tokens: u64, max_tokens: u64) -> f64 {
    if max_tokens == 0 {
        0.0
    } else {
        total_tokens as f64 / max_tokens as f64 * 100.0
    }
}

fn timestamp_from_millis(path: &Path, millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| SessionsError::MalformedStatusFile {
            path: path.to_path_buf(),
            details: format!("update timestamp out of range: {}", millis),
        })
}

/// The project directory is the transcript's parent when the file names a
/// transcript, otherwise the session's own working directory.
fn derive_project(transcript_path: Option<&str>, cwd: &str) -> (String, String) {
    let project_dir = transcript_path
        .map(Path::new)
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_else(|| cwd.to_string());
    let project_name = Path::new(&project_dir)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_dir.clone());
    (project_dir, project_name)
}
