//! Session phases and the durations that drive them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The timed state a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Before the first WORK phase starts and after the session stops.
    Idle,
    /// Focus time: participants are muted.
    Work,
    /// Break time: participants are unmuted.
    Break,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Work => write!(f, "work"),
            Self::Break => write!(f, "break"),
        }
    }
}

/// Work and break lengths, fixed for the lifetime of a session.
///
/// Minutes are whole numbers of at least one; anything smaller is
/// floored to one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    work_minutes: u64,
    break_minutes: u64,
}

impl PhaseDurations {
    /// Build durations from caller-supplied minutes.
    #[must_use]
    pub fn from_minutes(work_minutes: i64, break_minutes: i64) -> Self {
        Self {
            work_minutes: floor_minutes(work_minutes),
            break_minutes: floor_minutes(break_minutes),
        }
    }

    #[must_use]
    pub fn work_minutes(&self) -> u64 {
        self.work_minutes
    }

    #[must_use]
    pub fn break_minutes(&self) -> u64 {
        self.break_minutes
    }

    /// Length of the WORK phase in whole seconds.
    #[must_use]
    pub fn work(&self) -> Duration {
        Duration::from_secs(self.work_minutes.saturating_mul(60))
    }

    /// Length of the BREAK phase in whole seconds.
    #[must_use]
    pub fn rest(&self) -> Duration {
        Duration::from_secs(self.break_minutes.saturating_mul(60))
    }
}

fn floor_minutes(minutes: i64) -> u64 {
    u64::try_from(minutes.max(1)).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_convert_to_seconds() {
        let d = PhaseDurations::from_minutes(45, 15);
        assert_eq!(d.work(), Duration::from_secs(2700));
        assert_eq!(d.rest(), Duration::from_secs(900));
    }

    #[test]
    fn non_positive_minutes_floor_to_one() {
        let d = PhaseDurations::from_minutes(0, -5);
        assert_eq!(d.work_minutes(), 1);
        assert_eq!(d.break_minutes(), 1);
        assert_eq!(d.work(), Duration::from_secs(60));
    }

    #[test]
    fn huge_minutes_are_kept() {
        let d = PhaseDurations::from_minutes(i64::MAX, 1);
        assert_eq!(d.work_minutes(), i64::MAX.unsigned_abs());
        assert!(d.work() > Duration::from_secs(60 * 60 * 24 * 365));
    }

    #[test]
    fn phase_serializes_lowercase() {
        let json = serde_json::to_string(&Phase::Break).unwrap();
        assert_eq!(json, "\"break\"");
    }
}
