//! End-to-end tests for the watch loop: publication, mutation, shutdown.
//!
//! These drive a real watcher thread against a temp directory. Assertions
//! poll with a deadline rather than sleeping fixed amounts, so they hold
//! whether a change is noticed by the directory watcher or by the fallback
//! interval timer.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use sessions_core::{status_file_name, ConfigHandle, SessionWatcher, WatchConfig};
use tempfile::TempDir;

const DEADLINE: Duration = Duration::from_secs(5);

fn fast_config() -> ConfigHandle {
    ConfigHandle::new(WatchConfig {
        refresh_interval_secs: 0.1,
        ..WatchConfig::default()
    })
}

fn write_status_file(dir: &Path, cwd: &str, session_id: &str) {
    let doc = format!(
        r#"{{
            "session_id": "{}",
            "cwd": "{}",
            "model": {{"display_name": "Claude", "id": "claude-test"}},
            "context_window": {{
                "total_input_tokens": 1000,
                "total_output_tokens": 500,
                "context_window_size": 200000
            }},
            "cost": {{"total_cost_usd": 0.25, "total_duration_ms": 30000}},
            "_statusline_update_time": {}
        }}"#,
        session_id,
        cwd,
        Utc::now().timestamp_millis()
    );
    std::fs::write(dir.join(status_file_name(cwd)), doc).unwrap();
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + DEADLINE;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn publishes_existing_sessions_on_start() {
    let temp = TempDir::new().unwrap();
    write_status_file(temp.path(), "/tmp/one", "s1");
    write_status_file(temp.path(), "/tmp/two", "s2");

    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), fast_config()).unwrap();
    assert!(wait_until(|| watcher.latest().sessions.len() == 2));
    watcher.stop();
}

#[test]
fn creates_missing_watch_directory() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("deep").join(".claude_sessions");

    let mut watcher = SessionWatcher::start(nested.clone(), fast_config()).unwrap();
    assert!(nested.is_dir());
    assert!(wait_until(|| watcher.latest().seq >= 1));
    assert!(watcher.latest().sessions.is_empty());
    watcher.stop();
}

#[test]
fn detects_new_status_file() {
    let temp = TempDir::new().unwrap();
    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), fast_config()).unwrap();
    assert!(wait_until(|| watcher.latest().seq >= 1));

    write_status_file(temp.path(), "/tmp/fresh", "s-new");
    assert!(wait_until(|| {
        let snapshot = watcher.latest();
        snapshot.sessions.iter().any(|s| s.session_id == "s-new")
    }));
    watcher.stop();
}

#[test]
fn malformed_file_is_skipped_not_fatal() {
    let temp = TempDir::new().unwrap();
    write_status_file(temp.path(), "/tmp/good", "s-good");
    std::fs::write(temp.path().join("claude-status-bad.json"), "{nope").unwrap();

    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), fast_config()).unwrap();
    assert!(wait_until(|| {
        let snapshot = watcher.latest();
        snapshot.seq >= 1 && snapshot.sessions.len() == 1
    }));
    assert_eq!(watcher.latest().sessions[0].session_id, "s-good");
    watcher.stop();
}

#[test]
fn remove_deletes_backing_file_and_republishes() {
    let temp = TempDir::new().unwrap();
    write_status_file(temp.path(), "/tmp/keep", "s-keep");
    write_status_file(temp.path(), "/tmp/drop", "s-drop");

    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), fast_config()).unwrap();
    assert!(wait_until(|| watcher.latest().sessions.len() == 2));
    let kept_before = watcher
        .latest()
        .sessions
        .iter()
        .find(|s| s.session_id == "s-keep")
        .cloned()
        .unwrap();

    watcher.remove("/tmp/drop");
    assert!(wait_until(|| watcher.latest().sessions.len() == 1));

    assert!(!temp.path().join(status_file_name("/tmp/drop")).exists());
    let snapshot = watcher.latest();
    assert_eq!(snapshot.sessions[0], kept_before);
    watcher.stop();
}

#[test]
fn remove_of_missing_file_still_rescans() {
    let temp = TempDir::new().unwrap();
    write_status_file(temp.path(), "/tmp/only", "s1");

    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), fast_config()).unwrap();
    assert!(wait_until(|| watcher.latest().sessions.len() == 1));
    let seq_before = watcher.latest().seq;

    watcher.remove("/tmp/never-existed");
    assert!(wait_until(|| watcher.latest().seq > seq_before));
    assert_eq!(watcher.latest().sessions.len(), 1);
    watcher.stop();
}

#[test]
fn subscribers_receive_monotonic_snapshots() {
    let temp = TempDir::new().unwrap();
    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), fast_config()).unwrap();
    let updates = watcher.subscribe();

    watcher.refresh();
    watcher.refresh();

    let first = updates.recv_timeout(DEADLINE).unwrap();
    let second = updates.recv_timeout(DEADLINE).unwrap();
    assert!(second.seq > first.seq);
    watcher.stop();
}

#[test]
fn stop_is_idempotent_and_halts_publication() {
    let temp = TempDir::new().unwrap();
    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), fast_config()).unwrap();
    assert!(wait_until(|| watcher.latest().seq >= 1));

    watcher.stop();
    watcher.stop();

    let seq_at_stop = watcher.latest().seq;
    write_status_file(temp.path(), "/tmp/late", "s-late");
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(watcher.latest().seq, seq_at_stop);
}

#[test]
fn interval_change_applies_without_restart() {
    let temp = TempDir::new().unwrap();
    let config = ConfigHandle::new(WatchConfig {
        // Slow enough that only the directory watcher or a config change
        // could produce timely rescans.
        refresh_interval_secs: 30.0,
        ..WatchConfig::default()
    });
    let mut watcher = SessionWatcher::start(temp.path().to_path_buf(), config.clone()).unwrap();
    assert!(wait_until(|| watcher.latest().seq >= 1));

    config.update(|c| c.refresh_interval_secs = 0.05);
    // A refresh unblocks the loop; from then on the new interval drives
    // periodic scans with no events at all.
    watcher.refresh();
    let seq_before = watcher.latest().seq;
    assert!(wait_until(|| watcher.latest().seq > seq_before + 2));
    watcher.stop();
}
