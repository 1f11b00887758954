//! OS pass-through actions for session rows.
//!
//! These depend only on the session record's `cwd` and `session_id`; the
//! core never calls them.

use sessions_core::Session;

/// The shell command that resumes a session in its working directory.
pub fn resume_command(session: &Session) -> String {
    format!("cd '{}' && claude -r {}", session.cwd, session.session_id)
}

pub fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| format!("Clipboard unavailable: {}", e))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| format!("Failed to write clipboard: {}", e))
}

/// Opens a terminal window at a working directory.
pub fn open_terminal(cwd: &str) -> Result<(), String> {
    open_terminal_with_command(&format!("cd '{}' && clear", cwd))
}

/// Opens a terminal window running a shell command.
#[cfg(target_os = "macos")]
pub fn open_terminal_with_command(command: &str) -> Result<(), String> {
    let script = format!(
        r#"tell application "Terminal"
            activate
            do script "{}"
        end tell"#,
        command.replace('\\', r"\\").replace('"', r#"\""#)
    );
    std::process::Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .spawn()
        .map_err(|e| format!("Failed to launch Terminal: {}", e))?;
    Ok(())
}

#[cfg(not(target_os = "macos"))]
pub fn open_terminal_with_command(command: &str) -> Result<(), String> {
    std::process::Command::new("x-terminal-emulator")
        .args(["-e", "sh", "-c", &format!("{}; exec $SHELL", command)])
        .spawn()
        .map_err(|e| format!("Failed to launch terminal: {}", e))?;
    Ok(())
}

/// Reveals a working directory in the platform file browser.
pub fn reveal_in_file_browser(cwd: &str) -> Result<(), String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(cwd)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(cwd)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(cwd)
            .spawn()
            .map_err(|e| format!("Failed to open folder: {}", e))?;
    }

    Ok(())
}
