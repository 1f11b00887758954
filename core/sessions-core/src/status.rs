//! Liveness classification for sessions.
//!
//! Status is a pure function of elapsed time since the last status-file
//! update. It is recomputed on every evaluation and never stored on the
//! record, since "now" advances independently of scans.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Elapsed-time cutoffs separating the three liveness tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Below this the session is active.
    pub activity: Duration,
    /// At or above this the session is closed.
    pub closed: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            activity: Duration::from_secs(3),
            closed: Duration::from_secs(3600),
        }
    }
}

/// Liveness of a session, derived from time since last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Idle,
    Closed,
}

impl SessionStatus {
    /// Classifies elapsed time against the thresholds.
    ///
    /// Boundaries fall to the less urgent tier: elapsed equal to the
    /// activity threshold is already `Idle`, equal to the closed threshold
    /// is already `Closed`.
    pub fn classify(elapsed: Duration, thresholds: &Thresholds) -> Self {
        if elapsed < thresholds.activity {
            SessionStatus::Active
        } else if elapsed < thresholds.closed {
            SessionStatus::Idle
        } else {
            SessionStatus::Closed
        }
    }

    /// Sort priority; lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            SessionStatus::Active => 0,
            SessionStatus::Idle => 1,
            SessionStatus::Closed => 2,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            SessionStatus::Active => "🟢",
            SessionStatus::Idle => "🟡",
            SessionStatus::Closed => "⚪",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Idle => "idle",
            SessionStatus::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_secs(secs: f64) -> SessionStatus {
        SessionStatus::classify(Duration::from_secs_f64(secs), &Thresholds::default())
    }

    #[test]
    fn test_classify_tiers() {
        assert_eq!(classify_secs(0.0), SessionStatus::Active);
        assert_eq!(classify_secs(2.9), SessionStatus::Active);
        assert_eq!(classify_secs(10.0), SessionStatus::Idle);
        assert_eq!(classify_secs(3599.0), SessionStatus::Idle);
        assert_eq!(classify_secs(7200.0), SessionStatus::Closed);
    }

    #[test]
    fn test_classify_exact_boundaries() {
        // Boundary values belong to the less urgent tier.
        assert_eq!(classify_secs(3.0), SessionStatus::Idle);
        assert_eq!(classify_secs(3600.0), SessionStatus::Closed);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let samples = [0.0, 1.0, 2.999, 3.0, 60.0, 3599.9, 3600.0, 86400.0];
        let mut last_priority = 0;
        for secs in samples {
            let priority = classify_secs(secs).priority();
            assert!(priority >= last_priority, "priority regressed at {}s", secs);
            last_priority = priority;
        }
    }

    #[test]
    fn test_classify_custom_thresholds() {
        let thresholds = Thresholds {
            activity: Duration::from_secs(10),
            closed: Duration::from_secs(60),
        };
        assert_eq!(
            SessionStatus::classify(Duration::from_secs(9), &thresholds),
            SessionStatus::Active
        );
        assert_eq!(
            SessionStatus::classify(Duration::from_secs(10), &thresholds),
            SessionStatus::Idle
        );
        assert_eq!(
            SessionStatus::classify(Duration::from_secs(60), &thresholds),
            SessionStatus::Closed
        );
    }

    #[test]
    fn test_priority_order() {
        assert!(SessionStatus::Active.priority() < SessionStatus::Idle.priority());
        assert!(SessionStatus::Idle.priority() < SessionStatus::Closed.priority());
    }
}
