//! The phase loop: WORK → alert → BREAK → alert → WORK, until cancelled.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use focus_gate_platform::{TextSink, VoiceLink};
use focus_gate_types::{ChannelId, GroupId, PhaseDurations, SessionId};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::alert::AlertSignal;
use crate::countdown::{countdown, Countdown};
use crate::error::FocusError;
use crate::gate::{MembershipGate, SweepStatus};
use crate::session::SessionStatus;
use crate::state::LoopState;

const WORK_REASON: &str = "focus session started";
const BREAK_REASON: &str = "focus session break";
const CLEANUP_REASON: &str = "focus session finished";

/// Why the loop exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The cancel handle was raised.
    Cancelled,
    /// The loop body failed or panicked; cleanup still ran.
    Failed(String),
}

/// One session's scheduler. Owned by the session task.
pub(crate) struct PhaseLoop {
    pub(crate) id: SessionId,
    pub(crate) channel: ChannelId,
    pub(crate) durations: PhaseDurations,
    pub(crate) tick: Duration,
    pub(crate) prefix: String,
    pub(crate) gate: MembershipGate,
    pub(crate) alert: AlertSignal,
    pub(crate) voice: Arc<dyn VoiceLink>,
    pub(crate) text: Arc<dyn TextSink>,
    pub(crate) status: watch::Sender<SessionStatus>,
    pub(crate) cancel: CancellationToken,
    /// Groups muted by a WORK sweep and not yet fully unmuted.
    pub(crate) muted_groups: Mutex<BTreeSet<GroupId>>,
}

impl PhaseLoop {
    /// Supervise the loop body, then always run cleanup.
    ///
    /// The body runs as its own task so that a cancellation can abort it at
    /// any await point and a panic surfaces as a `JoinError` instead of
    /// skipping the unmute.
    pub(crate) async fn run(self: Arc<Self>) -> LoopExit {
        info!(
            session = %self.id,
            work_minutes = self.durations.work_minutes(),
            break_minutes = self.durations.break_minutes(),
            "starting focus loop"
        );

        let body_loop = Arc::clone(&self);
        let mut body = tokio::spawn(async move { body_loop.cycle().await });
        let joined = tokio::select! {
            joined = &mut body => joined,
            () = self.cancel.cancelled() => {
                body.abort();
                body.await
            }
        };

        let exit = match joined {
            Ok(Ok(())) => LoopExit::Cancelled,
            Ok(Err(e)) => {
                error!(session = %self.id, error = %e, "focus loop failed");
                LoopExit::Failed(e.to_string())
            }
            Err(e) if e.is_panic() => {
                error!(session = %self.id, "focus loop panicked");
                LoopExit::Failed("the focus loop panicked".to_string())
            }
            Err(_) => {
                info!(session = %self.id, "focus loop cancelled");
                LoopExit::Cancelled
            }
        };

        if let LoopExit::Failed(reason) = &exit {
            let message = FocusError::LoopInternal(reason.clone()).user_message(&self.prefix);
            self.notify(&message).await;
        }

        self.cleanup().await;
        exit
    }

    async fn cycle(&self) -> Result<(), FocusError> {
        let mut state = LoopState::Work;
        while !state.is_terminal() {
            self.enter(state);
            let outcome = match state {
                LoopState::Work => self.work().await?,
                LoopState::Break => self.rest().await?,
                LoopState::AlertAfterWork | LoopState::AlertAfterBreak => {
                    let outcome = self.alert.announce(self.channel).await;
                    debug!(session = %self.id, ?outcome, "alert sounded");
                    Countdown::Elapsed
                }
                LoopState::Stopped => Countdown::Cancelled,
            };
            if outcome == Countdown::Cancelled {
                return Ok(());
            }
            if state.completes_cycle() {
                self.status.send_modify(|s| s.cycle += 1);
            }
            state = state.next();
        }
        Ok(())
    }

    async fn work(&self) -> Result<Countdown, FocusError> {
        let group = self.resolve_group().await?;
        self.lock_muted_groups().insert(group);
        self.gate
            .apply_mute_until(group, true, WORK_REASON, &self.cancel)
            .await;
        let cycle = self.status.borrow().cycle;
        self.notify(&format!(
            "🚀 **Pomodoro {cycle}**: focus for **{}** minutes. Participants are muted.",
            self.durations.work_minutes()
        ))
        .await;
        Ok(countdown(self.durations.work(), self.tick, &self.cancel).await)
    }

    async fn rest(&self) -> Result<Countdown, FocusError> {
        self.resolve_group().await?;
        // Unmute where WORK muted, even if the agent has since been moved.
        let muted: Vec<GroupId> = self.lock_muted_groups().iter().copied().collect();
        for group in muted {
            let report = self
                .gate
                .apply_mute_until(group, false, BREAK_REASON, &self.cancel)
                .await;
            if report.status == SweepStatus::Complete {
                self.lock_muted_groups().remove(&group);
            }
        }
        self.notify(&format!(
            "☕ **Break**: relax for **{}** minutes. Participants are unmuted.",
            self.durations.break_minutes()
        ))
        .await;
        Ok(countdown(self.durations.rest(), self.tick, &self.cancel).await)
    }

    fn enter(&self, state: LoopState) {
        debug!(session = %self.id, %state, "entering state");
        self.status.send_modify(|s| {
            s.state = state;
            s.phase = state.phase();
        });
    }

    /// The group to sweep: wherever the agent is connected now, else the
    /// last known group. Membership itself is fetched fresh by the gate.
    async fn resolve_group(&self) -> Result<GroupId, FocusError> {
        let connected = self
            .voice
            .connected_group()
            .await
            .map_err(|e| FocusError::LoopInternal(format!("could not read voice state: {e}")))?;
        let last_known = self.status.borrow().group;
        let group = connected.unwrap_or_else(|| {
            warn!(session = %self.id, group = %last_known, "not connected to voice, using the session's group");
            last_known
        });
        if group != last_known {
            info!(session = %self.id, from = %last_known, to = %group, "session group changed");
            self.status.send_modify(|s| s.group = group);
        }
        Ok(group)
    }

    /// Best-effort unmute of every group this session may have muted,
    /// whatever ended the loop.
    async fn cleanup(&self) {
        let last_known = self.status.borrow().group;
        let current = match self.voice.connected_group().await {
            Ok(Some(group)) => group,
            Ok(None) => last_known,
            Err(e) => {
                warn!(session = %self.id, error = %e, "could not read voice state during cleanup");
                last_known
            }
        };
        let mut groups = std::mem::take(&mut *self.lock_muted_groups());
        groups.insert(current);
        for group in &groups {
            self.gate.apply_mute(*group, false, CLEANUP_REASON).await;
        }
        self.status.send_modify(|s| {
            s.state = LoopState::Stopped;
            s.phase = LoopState::Stopped.phase();
            s.finished = true;
        });
        info!(session = %self.id, groups = ?groups, "focus loop finished");
    }

    fn lock_muted_groups(&self) -> MutexGuard<'_, BTreeSet<GroupId>> {
        self.muted_groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn notify(&self, content: &str) {
        if let Err(e) = self.text.send(self.channel, content).await {
            warn!(channel = %self.channel, error = %e, "failed to send message");
        }
    }
}
