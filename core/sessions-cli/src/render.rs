//! Terminal rendering for session rows.

use chrono::{DateTime, Utc};
use sessions_core::{Session, SessionStatus, WatchConfig};

/// Prints the full session list, one row per session, freshest tier first
/// (the list arrives already sorted).
pub fn print_session_list(sessions: &[Session], config: &WatchConfig) {
    let thresholds = config.thresholds();
    let now = Utc::now();

    let visible: Vec<(&Session, SessionStatus)> = sessions
        .iter()
        .map(|session| (session, session.status(now, &thresholds)))
        .filter(|(_, status)| config.show_closed || *status != SessionStatus::Closed)
        .collect();

    let active = visible
        .iter()
        .filter(|(_, status)| *status == SessionStatus::Active)
        .count();
    println!();
    println!("{} session(s), {} active", visible.len(), active);

    for (session, status) in visible {
        println!("{}", render_row(session, status, now));
    }
}

fn render_row(session: &Session, status: SessionStatus, now: DateTime<Utc>) -> String {
    let title = if !session.display_name.is_empty() {
        session.display_name.clone()
    } else if !session.first_prompt.is_empty() {
        session.first_prompt.clone()
    } else {
        session.display_cwd()
    };

    let mut row = format!(
        "{} {}  [{}]  {:.0}% ctx  {} tok  {}  {}",
        status.glyph(),
        title,
        session.model.display_name,
        session.context_window.used_percentage,
        format_tokens(session.token_usage.total()),
        format_cost(session.cost.total),
        format_relative_time(session.last_update_time, now),
    );
    if let Some(impact) = &session.code_impact {
        row.push_str(&format!("  +{}/-{}", impact.lines_added, impact.lines_removed));
    }
    row
}

fn format_tokens(total: u64) -> String {
    if total >= 1_000_000 {
        format!("{:.1}M", total as f64 / 1_000_000.0)
    } else if total >= 1_000 {
        format!("{:.1}k", total as f64 / 1_000.0)
    } else {
        total.to_string()
    }
}

fn format_cost(total: f64) -> String {
    format!("${:.2}", total)
}

fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(then).num_seconds().max(0);

    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        let mins = secs / 60;
        if mins == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", mins)
        }
    } else if secs < 86400 {
        let hours = secs / 3600;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else {
        let days = secs / 86400;
        if days == 1 {
            "yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    }
}
