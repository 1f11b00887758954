//! Core types shared across the session watcher clients.
//!
//! A [`Session`] is rebuilt from its status file on every scan; it is never
//! patched incrementally. Liveness status and net code impact are derived on
//! demand, not stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{SessionStatus, Thresholds};

/// The model a session is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub display_name: String,
    pub id: String,
}

/// Context-window occupancy at the time of the last status update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextWindow {
    pub used_percentage: f64,
    pub max_tokens: u64,
}

/// Cumulative token counts for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// Session cost in USD. Input/output are zero when the source schema only
/// reports a total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cost {
    pub total: f64,
    pub input: f64,
    pub output: f64,
}

/// Lines added/removed by the session. Absent on records whose source file
/// predates the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeImpact {
    pub lines_added: u64,
    pub lines_removed: u64,
}

impl CodeImpact {
    pub fn net_change(&self) -> i64 {
        self.lines_added as i64 - self.lines_removed as i64
    }
}

/// One tracked working-directory context, rebuilt from its status file on
/// every scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub cwd: String,
    /// Resolved from the session index; empty when no entry matched.
    pub display_name: String,
    /// Resolved from the session index; empty when no entry matched.
    pub first_prompt: String,
    pub project_dir: String,
    pub project_name: String,
    pub model: ModelInfo,
    pub context_window: ContextWindow,
    pub token_usage: TokenUsage,
    pub cost: Cost,
    pub duration_secs: f64,
    pub code_impact: Option<CodeImpact>,
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    /// Current liveness, evaluated against `now`.
    ///
    /// A last-update time in the future (clock skew between writers) clamps
    /// elapsed to zero and classifies as active.
    pub fn status(&self, now: DateTime<Utc>, thresholds: &Thresholds) -> SessionStatus {
        let elapsed = now
            .signed_duration_since(self.last_update_time)
            .to_std()
            .unwrap_or_default();
        SessionStatus::classify(elapsed, thresholds)
    }

    /// The working directory with the home prefix abbreviated to `~`.
    pub fn display_cwd(&self) -> String {
        abbreviate_home(&self.cwd)
    }
}

fn abbreviate_home(path: &str) -> String {
    let Some(home) = dirs::home_dir() else {
        return path.to_string();
    };
    let home = home.to_string_lossy();
    match path.strip_prefix(home.as_ref()) {
        Some("") => "~".to_string(),
        Some(rest) if rest.starts_with('/') => format!("~{}", rest),
        _ => path.to_string(),
    }
}
