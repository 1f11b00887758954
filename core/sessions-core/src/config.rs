//! Configuration for the session watcher.
//!
//! The watcher and scan engine receive configuration through an explicitly
//! injected [`ConfigHandle`]; there is no process-global state. Changes made
//! through the handle take effect on the watcher's next cycle without a
//! restart.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionsError};
use crate::status::Thresholds;

/// Tunable settings consumed by the watcher and scan engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Periodic rescan interval in seconds.
    pub refresh_interval_secs: f64,
    /// Sessions updated more recently than this are active.
    pub activity_threshold_secs: f64,
    /// Sessions older than this are closed.
    pub closed_threshold_secs: f64,
    /// Whether consumers should show closed sessions. The core always
    /// publishes them; filtering is a presentation choice.
    pub show_closed: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            refresh_interval_secs: 2.0,
            activity_threshold_secs: 3.0,
            closed_threshold_secs: 3600.0,
            show_closed: true,
        }
    }
}

impl WatchConfig {
    /// The timer interval, clamped away from zero so a bad settings file
    /// cannot spin the watch loop.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval_secs.max(0.1))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            activity: Duration::from_secs_f64(self.activity_threshold_secs.max(0.0)),
            closed: Duration::from_secs_f64(self.closed_threshold_secs.max(0.0)),
        }
    }
}

/// Shared, mutable configuration handle injected into the watcher at
/// construction. Clones refer to the same underlying settings.
#[derive(Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<Mutex<WatchConfig>>,
}

impl ConfigHandle {
    pub fn new(config: WatchConfig) -> Self {
        ConfigHandle {
            inner: Arc::new(Mutex::new(config)),
        }
    }

    /// A point-in-time copy of the settings.
    pub fn snapshot(&self) -> WatchConfig {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies a mutation; the watcher observes it on its next cycle.
    pub fn update(&self, apply: impl FnOnce(&mut WatchConfig)) {
        let mut config = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut config);
    }
}

/// Returns the directory the external CLI writes status files into
/// (`~/.claude_sessions`).
pub fn default_sessions_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".claude_sessions"))
        .ok_or(SessionsError::HomeDirNotFound)
}

/// Returns the path to the watcher settings file inside the sessions
/// directory.
pub fn settings_path(sessions_dir: &Path) -> PathBuf {
    sessions_dir.join("settings.json")
}

/// Loads watcher settings, returning defaults if the file is missing or
/// unreadable.
pub fn load_watch_config(sessions_dir: &Path) -> WatchConfig {
    fs::read_to_string(settings_path(sessions_dir))
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

/// Saves watcher settings next to the status files.
pub fn save_watch_config(sessions_dir: &Path, config: &WatchConfig) -> Result<()> {
    let path = settings_path(sessions_dir);
    let content =
        serde_json::to_string_pretty(config).map_err(|source| SessionsError::Json {
            context: "serializing watcher settings".to_string(),
            source,
        })?;
    fs::write(&path, content).map_err(|source| SessionsError::Io {
        context: format!("writing {}", path.display()),
        source,
    })
}
