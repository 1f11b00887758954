//! claude-sessions: terminal client for the Claude session watcher.
//!
//! Thin shell around `sessions-core`: it wires up logging and configuration,
//! starts the watcher, and renders published snapshots. All discovery and
//! freshness logic lives in the library.
//!
//! ## Subcommands
//!
//! - `watch` (default): live sorted session list, reprinted on every change
//! - `list`: one scan, print, exit
//! - `remove`: delete a session's backing status file
//! - `resume`: print, copy, or launch the resume command for a session
//! - `open-terminal` / `reveal`: OS pass-through actions

mod actions;
mod render;

use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sessions_core::{
    default_sessions_dir, load_watch_config, remove_status_file, scan_sessions, ConfigHandle,
    Session, SessionWatcher, WatchConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "claude-sessions")]
#[command(about = "Live view of Claude Code sessions")]
#[command(version)]
struct Cli {
    /// Directory the external CLI writes status files into
    /// (default: ~/.claude_sessions)
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the sessions directory and reprint the list on every change
    Watch(ViewArgs),

    /// Print the current session list once and exit
    List(ViewArgs),

    /// Delete the backing status file for a working directory
    Remove {
        #[arg(value_name = "CWD")]
        cwd: String,
    },

    /// Reconstruct the resume command for a working directory
    Resume {
        #[arg(value_name = "CWD")]
        cwd: String,

        /// Copy the command to the clipboard instead of printing it
        #[arg(long)]
        copy: bool,

        /// Launch the command in a new terminal window
        #[arg(long, conflicts_with = "copy")]
        launch: bool,
    },

    /// Open a terminal at a session's working directory
    OpenTerminal {
        #[arg(value_name = "CWD")]
        cwd: String,
    },

    /// Reveal a session's working directory in the file browser
    Reveal {
        #[arg(value_name = "CWD")]
        cwd: String,
    },
}

#[derive(Args, Default)]
struct ViewArgs {
    /// Rescan interval in seconds
    #[arg(long, value_name = "SECS")]
    interval: Option<f64>,

    /// Seconds after which a session stops counting as active
    #[arg(long, value_name = "SECS")]
    active_after: Option<f64>,

    /// Seconds after which a session counts as closed
    #[arg(long, value_name = "SECS")]
    closed_after: Option<f64>,

    /// Leave closed sessions out of the listing
    #[arg(long)]
    hide_closed: bool,
}

impl ViewArgs {
    /// Settings file first, command-line flags on top.
    fn resolve(&self, sessions_dir: &std::path::Path) -> WatchConfig {
        let mut config = load_watch_config(sessions_dir);
        if let Some(interval) = self.interval {
            config.refresh_interval_secs = interval;
        }
        if let Some(active_after) = self.active_after {
            config.activity_threshold_secs = active_after;
        }
        if let Some(closed_after) = self.closed_after {
            config.closed_threshold_secs = closed_after;
        }
        if self.hide_closed {
            config.show_closed = false;
        }
        config
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(message) = run(cli) {
        tracing::error!(error = %message, "claude-sessions failed");
        eprintln!("claude-sessions: {}", message);
        std::process::exit(1);
    }
}

fn init_logging() {
    let debug_enabled = env::var("CLAUDE_SESSIONS_DEBUG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let sessions_dir = match cli.dir {
        Some(dir) => dir,
        None => default_sessions_dir().map_err(|e| e.to_string())?,
    };
    std::fs::create_dir_all(&sessions_dir)
        .map_err(|e| format!("Failed to create {}: {}", sessions_dir.display(), e))?;

    match cli.command.unwrap_or(Commands::Watch(ViewArgs::default())) {
        Commands::Watch(args) => watch(sessions_dir, &args),
        Commands::List(args) => list(&sessions_dir, &args),
        Commands::Remove { cwd } => {
            remove_status_file(&sessions_dir, &cwd).map_err(|e| e.to_string())?;
            println!("Removed session for {}", cwd);
            Ok(())
        }
        Commands::Resume { cwd, copy, launch } => resume(&sessions_dir, &cwd, copy, launch),
        Commands::OpenTerminal { cwd } => actions::open_terminal(&cwd),
        Commands::Reveal { cwd } => actions::reveal_in_file_browser(&cwd),
    }
}

/// Runs until interrupted; every published snapshot is rendered in full.
fn watch(sessions_dir: PathBuf, args: &ViewArgs) -> Result<(), String> {
    let config = ConfigHandle::new(args.resolve(&sessions_dir));
    let mut watcher =
        SessionWatcher::start(sessions_dir, config.clone()).map_err(|e| e.to_string())?;
    let updates = watcher.subscribe();

    render::print_session_list(&watcher.latest().sessions, &config.snapshot());
    while let Ok(snapshot) = updates.recv() {
        render::print_session_list(&snapshot.sessions, &config.snapshot());
    }

    watcher.stop();
    Ok(())
}

fn list(sessions_dir: &std::path::Path, args: &ViewArgs) -> Result<(), String> {
    let config = args.resolve(sessions_dir);
    let sessions = scan_sessions(sessions_dir, &config).map_err(|e| e.to_string())?;
    render::print_session_list(&sessions, &config);
    Ok(())
}

fn resume(
    sessions_dir: &std::path::Path,
    cwd: &str,
    copy: bool,
    launch: bool,
) -> Result<(), String> {
    let session = find_session(sessions_dir, cwd)?;
    let command = actions::resume_command(&session);

    if copy {
        actions::copy_to_clipboard(&command)?;
        println!("Copied: {}", command);
    } else if launch {
        actions::open_terminal_with_command(&command)?;
    } else {
        println!("{}", command);
    }
    Ok(())
}

fn find_session(sessions_dir: &std::path::Path, cwd: &str) -> Result<Session, String> {
    let config = load_watch_config(sessions_dir);
    let sessions = scan_sessions(sessions_dir, &config).map_err(|e| e.to_string())?;
    sessions
        .into_iter()
        .find(|session| session.cwd == cwd)
        .ok_or_else(|| format!("No session found for {}", cwd))
}
