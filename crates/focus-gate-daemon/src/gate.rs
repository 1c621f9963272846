//! Membership gate: who gets muted, and applying it.

use std::sync::Arc;

use focus_gate_platform::{Moderation, MuteChange, Platform, PlatformError, Roster};
use focus_gate_types::{GroupId, Participant, ParticipantId, Phase};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the gate wants done to one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Mute,
    Unmute,
    /// Bots are never touched.
    Exempt,
}

/// Mute policy for `participant` during `phase`.
pub fn decide(participant: &Participant, phase: Phase) -> Decision {
    if participant.is_bot {
        return Decision::Exempt;
    }
    match phase {
        Phase::Work => Decision::Mute,
        Phase::Break | Phase::Idle => Decision::Unmute,
    }
}

/// How a sweep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStatus {
    /// Every eligible participant was attempted.
    Complete,
    /// The agent lacks the mute capability; nothing was attempted.
    PermissionMissing,
    /// The member list could not be fetched; nothing was attempted.
    RosterUnavailable,
    /// Cancellation was observed part-way through.
    Interrupted,
}

/// A participant whose mute call failed during a sweep.
#[derive(Debug)]
pub struct MuteFailure {
    pub participant: ParticipantId,
    pub error: PlatformError,
}

/// Per-participant results of one sweep.
#[derive(Debug)]
pub struct SweepReport {
    pub group: GroupId,
    pub muted: bool,
    pub status: SweepStatus,
    pub changed: usize,
    pub unchanged: usize,
    pub failures: Vec<MuteFailure>,
}

impl SweepReport {
    fn new(group: GroupId, muted: bool) -> Self {
        Self {
            group,
            muted,
            status: SweepStatus::Complete,
            changed: 0,
            unchanged: 0,
            failures: Vec::new(),
        }
    }

    /// Participants whose mute state actually changed.
    pub fn count_affected(&self) -> usize {
        self.changed
    }
}

/// Applies mute decisions through the platform's moderation capability.
#[derive(Clone)]
pub struct MembershipGate {
    roster: Arc<dyn Roster>,
    moderation: Arc<dyn Moderation>,
}

impl MembershipGate {
    pub fn new(platform: &Platform) -> Self {
        Self {
            roster: Arc::clone(&platform.roster),
            moderation: Arc::clone(&platform.moderation),
        }
    }

    /// Mute or unmute every current non-bot member of `group`.
    ///
    /// Never fails: a missing capability or roster returns an empty report,
    /// and per-participant failures are collected and the sweep continues.
    pub async fn apply_mute(&self, group: GroupId, muted: bool, reason: &str) -> SweepReport {
        self.apply_mute_until(group, muted, reason, &CancellationToken::new())
            .await
    }

    /// Like [`apply_mute`](Self::apply_mute), but stops between participants
    /// once `cancel` is raised.
    pub async fn apply_mute_until(
        &self,
        group: GroupId,
        muted: bool,
        reason: &str,
        cancel: &CancellationToken,
    ) -> SweepReport {
        let mut report = SweepReport::new(group, muted);
        if !self.has_capability(group).await {
            report.status = SweepStatus::PermissionMissing;
            return report;
        }

        let members = match self.roster.members(group).await {
            Ok(members) => members,
            Err(e) => {
                warn!(group = %group, error = %e, "failed to list group members");
                report.status = SweepStatus::RosterUnavailable;
                return report;
            }
        };

        let phase = if muted { Phase::Work } else { Phase::Idle };
        for participant in members.iter().filter(|p| decide(p, phase) != Decision::Exempt) {
            if cancel.is_cancelled() {
                debug!(group = %group, "sweep interrupted by cancellation");
                report.status = SweepStatus::Interrupted;
                break;
            }
            self.set_one(group, participant, muted, reason, &mut report)
                .await;
        }

        info!(
            group = %group,
            muted,
            changed = report.changed,
            unchanged = report.unchanged,
            failed = report.failures.len(),
            "mute sweep finished"
        );
        report
    }

    /// Apply the gate's decision to a single participant.
    pub async fn apply_one(
        &self,
        group: GroupId,
        participant: &Participant,
        phase: Phase,
        reason: &str,
    ) -> SweepReport {
        let decision = decide(participant, phase);
        let muted = decision == Decision::Mute;
        let mut report = SweepReport::new(group, muted);
        if decision == Decision::Exempt {
            return report;
        }
        if !self.has_capability(group).await {
            report.status = SweepStatus::PermissionMissing;
            return report;
        }
        self.set_one(group, participant, muted, reason, &mut report)
            .await;
        report
    }

    async fn has_capability(&self, group: GroupId) -> bool {
        match self.moderation.can_mute_members(group).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(group = %group, "missing mute-members permission; participants will not be muted");
                false
            }
            Err(e) => {
                warn!(group = %group, error = %e, "could not check mute-members permission");
                false
            }
        }
    }

    async fn set_one(
        &self,
        group: GroupId,
        participant: &Participant,
        muted: bool,
        reason: &str,
        report: &mut SweepReport,
    ) {
        match self
            .moderation
            .set_mute(group, participant.id, muted, reason)
            .await
        {
            Ok(MuteChange::Changed) => report.changed += 1,
            Ok(MuteChange::Unchanged) => report.unchanged += 1,
            Err(e) => {
                if e.is_permission_denied() {
                    warn!(participant = %participant, "no permission to change mute state");
                } else {
                    warn!(participant = %participant, error = %e, "failed to change mute state");
                }
                report.failures.push(MuteFailure {
                    participant: participant.id,
                    error: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use focus_gate_platform::mock::MockPlatform;

    use super::*;

    const ROOM: GroupId = GroupId(100);

    fn populated() -> (MockPlatform, MembershipGate) {
        let mock = MockPlatform::new();
        let handle = mock.handle();
        handle.enter(ROOM, Participant::member(1, "alice"));
        handle.enter(ROOM, Participant::member(2, "bob"));
        handle.enter(ROOM, Participant::bot(3, "music"));
        let gate = MembershipGate::new(&mock.platform());
        (mock, gate)
    }

    #[test]
    fn policy_exempts_bots_and_mutes_only_in_work() {
        let human = Participant::member(1, "alice");
        let bot = Participant::bot(2, "music");
        assert_eq!(decide(&human, Phase::Work), Decision::Mute);
        assert_eq!(decide(&human, Phase::Break), Decision::Unmute);
        assert_eq!(decide(&human, Phase::Idle), Decision::Unmute);
        assert_eq!(decide(&bot, Phase::Work), Decision::Exempt);
    }

    #[tokio::test]
    async fn sweep_mutes_humans_and_skips_bots() {
        let (mock, gate) = populated();
        let handle = mock.handle();

        let report = gate.apply_mute(ROOM, true, "focus").await;

        assert_eq!(report.status, SweepStatus::Complete);
        assert_eq!(report.count_affected(), 2);
        assert!(handle.is_muted(ParticipantId(1)));
        assert!(handle.is_muted(ParticipantId(2)));
        assert!(!handle.is_muted(ParticipantId(3)));
        assert!(handle.mute_calls().iter().all(|c| c.reason == "focus"));
    }

    #[tokio::test]
    async fn repeated_sweep_is_idempotent() {
        let (mock, gate) = populated();
        let handle = mock.handle();
        handle.force_mute(ParticipantId(1));

        let first = gate.apply_mute(ROOM, true, "focus").await;
        let second = gate.apply_mute(ROOM, true, "focus").await;

        assert_eq!(first.count_affected(), 1);
        assert_eq!(first.unchanged, 1);
        assert_eq!(second.count_affected(), 0);
        assert_eq!(second.unchanged, 2);
        assert!(handle.is_muted(ParticipantId(1)));
        assert!(handle.is_muted(ParticipantId(2)));
    }

    #[tokio::test]
    async fn missing_capability_is_a_no_op() {
        let (mock, gate) = populated();
        let handle = mock.handle();
        handle.set_can_mute(false);

        let report = gate.apply_mute(ROOM, true, "focus").await;

        assert_eq!(report.status, SweepStatus::PermissionMissing);
        assert_eq!(report.count_affected(), 0);
        assert!(handle.mute_calls().is_empty());
    }

    #[tokio::test]
    async fn per_participant_failure_does_not_abort_sweep() {
        let (mock, gate) = populated();
        let handle = mock.handle();
        handle.deny_mute(ParticipantId(1));

        let report = gate.apply_mute(ROOM, true, "focus").await;

        assert_eq!(report.status, SweepStatus::Complete);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].participant, ParticipantId(1));
        assert!(report.failures[0].error.is_permission_denied());
        assert!(handle.is_muted(ParticipantId(2)));
    }

    #[tokio::test]
    async fn cancelled_sweep_stops_early() {
        let (mock, gate) = populated();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = gate.apply_mute_until(ROOM, true, "focus", &cancel).await;

        assert_eq!(report.status, SweepStatus::Interrupted);
        assert!(mock.handle().mute_calls().is_empty());
    }

    #[tokio::test]
    async fn apply_one_follows_phase() {
        let (mock, gate) = populated();
        let handle = mock.handle();
        let alice = Participant::member(1, "alice");

        let report = gate.apply_one(ROOM, &alice, Phase::Work, "joined").await;
        assert_eq!(report.count_affected(), 1);
        assert!(handle.is_muted(alice.id));

        let bot = Participant::bot(3, "music");
        let report = gate.apply_one(ROOM, &bot, Phase::Work, "joined").await;
        assert_eq!(report.count_affected(), 0);
        assert!(!handle.is_muted(bot.id));
    }
}
