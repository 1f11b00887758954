//! Per-project session index resolution.
//!
//! Each project directory may contain a `sessions-index.json` catalog written
//! by the external CLI: a list of `{sessionId, customTitle?, summary?,
//! firstPrompt?}` entries. The cache lives for exactly one scan; it memoizes
//! success and absence alike, so each index file is read at most once per
//! scan and a rewrite mid-scan is not observed until the next scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

pub const INDEX_FILE_NAME: &str = "sessions-index.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexEntry {
    session_id: String,
    #[serde(default)]
    custom_title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    first_prompt: Option<String>,
}

impl IndexEntry {
    /// A non-empty custom title wins over the generated summary.
    fn display_name(&self) -> String {
        match self.custom_title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.summary.clone().unwrap_or_default(),
        }
    }
}

/// Display metadata resolved for one session. Fields are empty when no
/// index entry matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub name: String,
    pub first_prompt: String,
}

/// Scan-scoped memoization of index files, keyed by project directory.
///
/// Built fresh at the start of every scan and discarded with it; never
/// shared across scans.
#[derive(Debug, Default)]
pub struct IndexCache {
    indexes: HashMap<PathBuf, Option<Vec<IndexEntry>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        IndexCache::default()
    }

    /// Looks up display metadata for a session.
    ///
    /// Never fails: a missing or unreadable index yields empty fields for
    /// every session in that directory for the rest of the scan. The first
    /// entry with a matching id wins.
    pub fn resolve(&mut self, project_dir: &Path, session_id: &str) -> ResolvedTitle {
        let entries = self
            .indexes
            .entry(project_dir.to_path_buf())
            .or_insert_with(|| read_index(project_dir));

        let Some(entries) = entries else {
            return ResolvedTitle::default();
        };
        let Some(entry) = entries.iter().find(|entry| entry.session_id == session_id) else {
            return ResolvedTitle::default();
        };

        ResolvedTitle {
            name: entry.display_name(),
            first_prompt: entry.first_prompt.clone().unwrap_or_default(),
        }
    }
}

fn read_index(project_dir: &Path) -> Option<Vec<IndexEntry>> {
    let path = project_dir.join(INDEX_FILE_NAME);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(entries) => Some(entries),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Skipping unreadable session index");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_index(dir: &Path, content: &str) {
        fs::write(dir.join(INDEX_FILE_NAME), content).unwrap();
    }

    #[test]
    fn test_custom_title_wins_over_summary() {
        let temp = TempDir::new().unwrap();
        write_index(
            temp.path(),
            r#"[{"sessionId": "s1", "customTitle": "T", "summary": "S"}]"#,
        );

        let mut cache = IndexCache::new();
        let resolved = cache.resolve(temp.path(), "s1");
        assert_eq!(resolved.name, "T");
    }

    #[test]
    fn test_empty_custom_title_falls_back_to_summary() {
        let temp = TempDir::new().unwrap();
        write_index(
            temp.path(),
            r#"[{"sessionId": "s1", "customTitle": "", "summary": "S", "firstPrompt": "fix the bug"}]"#,
        );

        let mut cache = IndexCache::new();
        let resolved = cache.resolve(temp.path(), "s1");
        assert_eq!(resolved.name, "S");
        assert_eq!(resolved.first_prompt, "fix the bug");
    }

    #[test]
    fn test_unknown_session_id_resolves_empty() {
        let temp = TempDir::new().unwrap();
        write_index(temp.path(), r#"[{"sessionId": "s1", "summary": "S"}]"#);

        let mut cache = IndexCache::new();
        assert_eq!(cache.resolve(temp.path(), "other"), ResolvedTitle::default());
    }

    #[test]
    fn test_missing_index_file_resolves_empty() {
        let temp = TempDir::new().unwrap();
        let mut cache = IndexCache::new();
        assert_eq!(cache.resolve(temp.path(), "s1"), ResolvedTitle::default());
    }

    #[test]
    fn test_corrupt_index_file_resolves_empty() {
        let temp = TempDir::new().unwrap();
        write_index(temp.path(), "{broken");

        let mut cache = IndexCache::new();
        assert_eq!(cache.resolve(temp.path(), "s1"), ResolvedTitle::default());
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let temp = TempDir::new().unwrap();
        write_index(
            temp.path(),
            r#"[
                {"sessionId": "s1", "summary": "first"},
                {"sessionId": "s1", "summary": "second"}
            ]"#,
        );

        let mut cache = IndexCache::new();
        assert_eq!(cache.resolve(temp.path(), "s1").name, "first");
    }

    #[test]
    fn test_index_is_read_once_per_cache() {
        let temp = TempDir::new().unwrap();
        write_index(temp.path(), r#"[{"sessionId": "s1", "summary": "before"}]"#);

        let mut cache = IndexCache::new();
        assert_eq!(cache.resolve(temp.path(), "s1").name, "before");

        // A rewrite mid-scan is not observed by the same cache.
        write_index(temp.path(), r#"[{"sessionId": "s1", "summary": "after"}]"#);
        assert_eq!(cache.resolve(temp.path(), "s1").name, "before");

        // A fresh cache (next scan) sees the new contents.
        let mut next_scan = IndexCache::new();
        assert_eq!(next_scan.resolve(temp.path(), "s1").name, "after");
    }

    #[test]
    fn test_absence_is_cached_too() {
        let temp = TempDir::new().unwrap();
        let mut cache = IndexCache::new();
        assert_eq!(cache.resolve(temp.path(), "s1"), ResolvedTitle::default());

        // An index appearing mid-scan is likewise not observed.
        write_index(temp.path(), r#"[{"sessionId": "s1", "summary": "late"}]"#);
        assert_eq!(cache.resolve(temp.path(), "s1"), ResolvedTitle::default());
    }
}
