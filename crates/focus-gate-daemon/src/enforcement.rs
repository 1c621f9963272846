//! Join-time enforcement: mute participants who enter during WORK.

use focus_gate_types::{Phase, VoiceStateChange};
use tracing::{debug, info};

use crate::gate::SweepReport;
use crate::session::SessionManager;

const JOIN_REASON: &str = "joined during focus session";

/// Why a voice state change was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinIgnored {
    /// No session, or it is stopping.
    NoSession,
    /// The change does not bring anyone into the session's group.
    NotEntering,
    /// The session is in BREAK.
    NotWorkPhase,
    Bot,
}

/// Result of handling one voice state change.
#[derive(Debug)]
pub enum JoinOutcome {
    Applied(SweepReport),
    Ignored(JoinIgnored),
}

impl SessionManager {
    /// React to a participant's voice state change.
    ///
    /// Runs concurrently with the loop's own sweeps. Both only ever set mute
    /// to the phase's value, so interleaving needs no ordering.
    pub async fn on_voice_state_update(&self, change: &VoiceStateChange) -> JoinOutcome {
        let Some(status) = self.active_status() else {
            return JoinOutcome::Ignored(JoinIgnored::NoSession);
        };
        if !change.enters(status.group) {
            return JoinOutcome::Ignored(JoinIgnored::NotEntering);
        }
        if change.participant.is_bot {
            return JoinOutcome::Ignored(JoinIgnored::Bot);
        }
        if status.phase != Phase::Work {
            debug!(participant = %change.participant, phase = %status.phase, "joined outside work phase");
            return JoinOutcome::Ignored(JoinIgnored::NotWorkPhase);
        }

        info!(participant = %change.participant, group = %status.group, "muting participant who joined mid-focus");
        let report = self
            .gate
            .apply_one(status.group, &change.participant, Phase::Work, JOIN_REASON)
            .await;
        JoinOutcome::Applied(report)
    }
}
