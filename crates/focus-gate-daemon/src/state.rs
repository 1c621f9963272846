//! Phase scheduler state machine.

use focus_gate_types::Phase;

/// Where the scheduler loop is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Participants muted, work countdown running.
    Work,
    /// Work countdown elapsed, alert sounding.
    AlertAfterWork,
    /// Participants unmuted, break countdown running.
    Break,
    /// Break countdown elapsed, alert sounding.
    AlertAfterBreak,
    /// Terminal: cancelled or failed, cleanup done.
    Stopped,
}

impl LoopState {
    /// The state that follows this one when its step completes normally.
    /// `Stopped` is only reached through cancellation or failure.
    pub fn next(self) -> Self {
        match self {
            Self::Work => Self::AlertAfterWork,
            Self::AlertAfterWork => Self::Break,
            Self::Break => Self::AlertAfterBreak,
            Self::AlertAfterBreak => Self::Work,
            Self::Stopped => Self::Stopped,
        }
    }

    /// Whether leaving this state completes a cycle.
    pub fn completes_cycle(self) -> bool {
        self == Self::AlertAfterBreak
    }

    /// The externally visible phase. Alerts belong to the phase they close.
    pub fn phase(self) -> Phase {
        match self {
            Self::Work | Self::AlertAfterWork => Phase::Work,
            Self::Break | Self::AlertAfterBreak => Phase::Break,
            Self::Stopped => Phase::Idle,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Stopped
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Work => write!(f, "Work"),
            Self::AlertAfterWork => write!(f, "AlertAfterWork"),
            Self::Break => write!(f, "Break"),
            Self::AlertAfterBreak => write!(f, "AlertAfterBreak"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_to_work() {
        let mut state = LoopState::Work;
        let mut completed = 0;
        for _ in 0..4 {
            if state.completes_cycle() {
                completed += 1;
            }
            state = state.next();
        }
        assert_eq!(state, LoopState::Work);
        assert_eq!(completed, 1);
    }

    #[test]
    fn stopped_is_absorbing() {
        assert_eq!(LoopState::Stopped.next(), LoopState::Stopped);
        assert!(LoopState::Stopped.is_terminal());
        assert_eq!(LoopState::Stopped.phase(), Phase::Idle);
    }

    #[test]
    fn alerts_report_the_phase_they_close() {
        assert_eq!(LoopState::AlertAfterWork.phase(), Phase::Work);
        assert_eq!(LoopState::AlertAfterBreak.phase(), Phase::Break);
    }
}
