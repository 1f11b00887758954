//! Directory watching, scan scheduling, and snapshot publication.
//!
//! One background thread owns every scan, index read, and file mutation.
//! Three trigger sources feed it: an immediate scan on start, a periodic
//! tick at the configured refresh interval, and directory change events
//! from the platform watcher. Triggers are coalesced, not queued: the
//! command channel is drained before each scan, so a burst of events that
//! lands while a scan is in flight produces exactly one follow-up scan.
//!
//! Publication hands the finished list across to the consumer as a whole:
//! a snapshot slot replaced under a mutex, plus subscriber channels that
//! deliver each new snapshot on the consumer's own thread. The slot is
//! replaced only if the scan is newer than the one already published, and
//! publication becomes a no-op once the watcher is stopped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use fs_err as fs;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::config::ConfigHandle;
use crate::error::{Result, SessionsError};
use crate::scan::{remove_status_file, scan_sessions};
use crate::types::Session;

/// One published result set. `seq` increases with every completed scan.
#[derive(Debug, Clone)]
pub struct SessionsSnapshot {
    pub seq: u64,
    pub sessions: Arc<Vec<Session>>,
}

enum Command {
    Scan,
    Remove(String),
    Shutdown,
}

struct Published {
    seq: u64,
    sessions: Arc<Vec<Session>>,
    subscribers: Vec<Sender<SessionsSnapshot>>,
}

struct Shared {
    published: Mutex<Published>,
    stopped: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Shared {
            published: Mutex::new(Published {
                seq: 0,
                sessions: Arc::new(Vec::new()),
                subscribers: Vec::new(),
            }),
            stopped: AtomicBool::new(false),
        }
    }

    /// Atomically replaces the published list and notifies subscribers.
    ///
    /// A result older than the published one is dropped, and nothing is
    /// published after stop.
    fn publish(&self, seq: u64, sessions: Vec<Session>) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        if seq <= published.seq {
            debug!(seq, published = published.seq, "Dropping stale scan result");
            return;
        }
        published.seq = seq;
        published.sessions = Arc::new(sessions);
        let snapshot = SessionsSnapshot {
            seq,
            sessions: Arc::clone(&published.sessions),
        };
        published
            .subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }

    fn latest(&self) -> SessionsSnapshot {
        let published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        SessionsSnapshot {
            seq: published.seq,
            sessions: Arc::clone(&published.sessions),
        }
    }
}

/// Watches the sessions directory and keeps a sorted session list published.
///
/// Consumers read [`latest`](Self::latest) or receive pushed snapshots via
/// [`subscribe`](Self::subscribe); they never observe a partially built
/// list. Mutations ([`remove`](Self::remove)) are forwarded to the watch
/// thread so they serialize with scans.
pub struct SessionWatcher {
    watch_dir: PathBuf,
    command_tx: Sender<Command>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl SessionWatcher {
    /// Starts watching. Creates the directory (with parents) if absent,
    /// performs one immediate scan, then keeps scanning on directory events
    /// and the periodic timer until [`stop`](Self::stop).
    pub fn start(watch_dir: PathBuf, config: ConfigHandle) -> Result<Self> {
        fs::create_dir_all(&watch_dir).map_err(|source| SessionsError::Io {
            context: format!("creating {}", watch_dir.display()),
            source,
        })?;

        let (command_tx, command_rx) = mpsc::channel();
        let shared = Arc::new(Shared::new());

        let thread = {
            let watch_dir = watch_dir.clone();
            let shared = Arc::clone(&shared);
            let trigger_tx = command_tx.clone();
            std::thread::Builder::new()
                .name("session-watcher".to_string())
                .spawn(move || run_watch_loop(watch_dir, config, shared, trigger_tx, command_rx))
                .map_err(|source| SessionsError::Io {
                    context: "spawning watch thread".to_string(),
                    source,
                })?
        };

        Ok(SessionWatcher {
            watch_dir,
            command_tx,
            shared,
            thread: Some(thread),
        })
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    /// Forces an immediate rescan.
    pub fn refresh(&self) {
        let _ = self.command_tx.send(Command::Scan);
    }

    /// Deletes a session's backing status file and rescans. The delete runs
    /// on the watch thread so it cannot race an in-flight scan; failure is
    /// logged and the rescan happens regardless, so the published list
    /// reflects actual disk state.
    pub fn remove(&self, cwd: &str) {
        let _ = self.command_tx.send(Command::Remove(cwd.to_string()));
    }

    /// The most recently published list.
    pub fn latest(&self) -> SessionsSnapshot {
        self.shared.latest()
    }

    /// Registers a consumer. Every future publication delivers a full
    /// snapshot on the returned channel, on the receiving thread's own
    /// schedule.
    pub fn subscribe(&self) -> Receiver<SessionsSnapshot> {
        let (tx, rx) = mpsc::channel();
        self.shared
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .push(tx);
        rx
    }

    /// Stops the watcher. Idempotent: the first call makes publication
    /// inert, shuts down the watch thread, and releases the directory
    /// subscription; later calls do nothing.
    pub fn stop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_watch_loop(
    watch_dir: PathBuf,
    config: ConfigHandle,
    shared: Arc<Shared>,
    trigger_tx: Sender<Command>,
    command_rx: Receiver<Command>,
) {
    // The platform watcher lives exactly as long as this loop; dropping it
    // on exit releases the directory handle.
    let _fs_watcher = match watch_directory(&watch_dir, trigger_tx) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            warn!(error = %err, "Directory watch unavailable; polling on the refresh interval only");
            None
        }
    };

    let mut seq: u64 = 0;
    run_scan(&watch_dir, &config, &shared, &mut seq);

    let mut pending: Option<Command> = None;
    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => {
                // Reread the interval every cycle so configuration changes
                // take effect without restarting the watcher.
                let interval = config.snapshot().refresh_interval();
                match command_rx.recv_timeout(interval) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => Command::Scan,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        };

        match command {
            Command::Shutdown => break,
            Command::Remove(cwd) => {
                // Failure is logged and the rescan happens anyway, so the
                // published list reflects actual disk state.
                match remove_status_file(&watch_dir, &cwd) {
                    Ok(()) => info!(cwd = %cwd, "Removed session status file"),
                    Err(err) => warn!(error = %err, "Failed to remove session status file"),
                }
                pending = drain_scan_triggers(&command_rx);
                run_scan(&watch_dir, &config, &shared, &mut seq);
            }
            Command::Scan => {
                pending = drain_scan_triggers(&command_rx);
                run_scan(&watch_dir, &config, &shared, &mut seq);
            }
        }
    }

    debug!(path = %watch_dir.display(), "Session watch loop exited");
}

/// Collapses queued scan triggers into the single scan about to run.
///
/// Remove and shutdown commands are never skipped: draining stops at the
/// first non-scan command and hands it back to the loop.
fn drain_scan_triggers(command_rx: &Receiver<Command>) -> Option<Command> {
    loop {
        match command_rx.try_recv() {
            Ok(Command::Scan) => continue,
            Ok(other) => return Some(other),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
        }
    }
}

fn run_scan(watch_dir: &Path, config: &ConfigHandle, shared: &Shared, seq: &mut u64) {
    let snapshot_config = config.snapshot();
    match scan_sessions(watch_dir, &snapshot_config) {
        Ok(sessions) => {
            *seq += 1;
            shared.publish(*seq, sessions);
        }
        Err(err) => {
            // The previously published list stays in place for this cycle.
            warn!(error = %err, "Scan skipped");
        }
    }
}

fn watch_directory(watch_dir: &Path, trigger_tx: Sender<Command>) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(
        move |result: std::result::Result<Event, notify::Error>| match result {
            Ok(event) => {
                // Modify covers renames on every notify backend.
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    let _ = trigger_tx.send(Command::Scan);
                }
            }
            Err(err) => warn!(error = %err, "Directory watch error"),
        },
    )
    .map_err(|err| SessionsError::WatchSetupFailed {
        path: watch_dir.to_path_buf(),
        details: err.to_string(),
    })?;

    watcher
        .watch(watch_dir, RecursiveMode::NonRecursive)
        .map_err(|err| SessionsError::WatchSetupFailed {
            path: watch_dir.to_path_buf(),
            details: err.to_string(),
        })?;

    info!(path = %watch_dir.display(), "Watching sessions directory");
    Ok(watcher)
}
