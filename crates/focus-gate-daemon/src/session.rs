//! Session lifecycle: start, stop, leave, join, status.
//!
//! At most one session exists per manager. The single-session rule is a
//! check-then-act on the command path, re-checked under the slot lock just
//! before the new session is stored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use focus_gate_platform::{Platform, PlatformError};
use focus_gate_types::{ChannelId, GroupId, ParticipantId, Phase, PhaseDurations, SessionId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::alert::AlertSignal;
use crate::config::Config;
use crate::error::{ConnectFailure, FocusError};
use crate::gate::{MembershipGate, SweepReport};
use crate::scheduler::{LoopExit, PhaseLoop};
use crate::state::LoopState;

const LEAVE_REASON: &str = "leaving voice channel";

/// Snapshot of a session, published by its loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub id: SessionId,
    /// The voice group being managed. Follows the agent if it is moved.
    pub group: GroupId,
    /// Text channel that receives announcements.
    pub channel: ChannelId,
    pub phase: Phase,
    pub state: LoopState,
    /// Starts at 1; increments after each completed WORK→BREAK round.
    pub cycle: u64,
    pub durations: PhaseDurations,
    /// Set once cleanup has run.
    pub finished: bool,
}

/// Parameters of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartRequest {
    pub initiator: ParticipantId,
    pub channel: ChannelId,
    /// Falls back to the configured default when absent.
    pub work_minutes: Option<i64>,
    /// Falls back to the configured default when absent.
    pub break_minutes: Option<i64>,
}

/// What the agent had to do to reach a voice group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceMove {
    Connected,
    Moved,
    AlreadyThere,
}

/// How a stop sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The task finished, cleanup included.
    Settled(LoopExit),
    /// The wait gave up; the task keeps running its cleanup in the background.
    TimedOut,
}

/// Result of a leave.
#[derive(Debug)]
pub struct LeaveOutcome {
    pub group: GroupId,
    /// `None` when no session was running.
    pub stopped: Option<StopOutcome>,
    pub unmuted: SweepReport,
}

struct Session {
    id: SessionId,
    cancel: CancellationToken,
    status: watch::Receiver<SessionStatus>,
    task: Option<JoinHandle<LoopExit>>,
}

impl Session {
    fn is_finished(&self) -> bool {
        // A dropped sender means the task is gone even if it never got to
        // publish `finished`.
        self.status.borrow().finished || self.status.has_changed().is_err()
    }

    /// Live and not yet asked to stop.
    fn is_active(&self) -> bool {
        !self.is_finished() && !self.cancel.is_cancelled()
    }
}

/// Owns the single focus session and the collaborators it drives.
pub struct SessionManager {
    pub(crate) platform: Platform,
    pub(crate) config: Config,
    pub(crate) gate: MembershipGate,
    alert: AlertSignal,
    slot: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(platform: Platform, config: Config) -> Self {
        let gate = MembershipGate::new(&platform);
        let alert = AlertSignal::new(&platform, config.alert.clone());
        Self {
            platform,
            config,
            gate,
            alert,
            slot: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a session in the initiator's voice group.
    ///
    /// Setup failures (no voice context, voice connect) happen before any
    /// session exists.
    pub async fn start(&self, request: StartRequest) -> Result<SessionStatus, FocusError> {
        self.ensure_idle()?;

        let group = self
            .platform
            .roster
            .voice_group_of(request.initiator)
            .await?
            .ok_or(FocusError::NoVoiceContext)?;
        let moved = self.connect_to(group).await?;
        match moved {
            VoiceMove::Connected => {
                self.notify(
                    request.channel,
                    &format!("Connected to voice channel <#{group}> to manage focus mutes."),
                )
                .await;
            }
            VoiceMove::Moved => {
                self.notify(
                    request.channel,
                    &format!("Moved to voice channel <#{group}> to start the focus session."),
                )
                .await;
            }
            VoiceMove::AlreadyThere => {}
        }

        let durations = PhaseDurations::from_minutes(
            request
                .work_minutes
                .unwrap_or(self.config.timer.work_minutes),
            request
                .break_minutes
                .unwrap_or(self.config.timer.break_minutes),
        );
        let id = SessionId::new();
        let initial = SessionStatus {
            id,
            group,
            channel: request.channel,
            phase: Phase::Idle,
            state: LoopState::Work,
            cycle: 1,
            durations,
            finished: false,
        };
        let (status_tx, status_rx) = watch::channel(initial.clone());
        let cancel = CancellationToken::new();
        let phase_loop = Arc::new(PhaseLoop {
            id,
            channel: request.channel,
            durations,
            tick: self.config.timer.tick(),
            prefix: self.config.commands.prefix.clone(),
            gate: self.gate.clone(),
            alert: self.alert.clone(),
            voice: Arc::clone(&self.platform.voice),
            text: Arc::clone(&self.platform.text),
            status: status_tx,
            cancel: cancel.clone(),
            muted_groups: Mutex::default(),
        });

        let mut slot = self.lock_slot();
        if slot.as_ref().is_some_and(|s| !s.is_finished()) {
            return Err(FocusError::AlreadyRunning);
        }
        let task = tokio::spawn(phase_loop.run());
        *slot = Some(Session {
            id,
            cancel,
            status: status_rx,
            task: Some(task),
        });
        info!(
            session = %id,
            group = %group,
            work_minutes = durations.work_minutes(),
            break_minutes = durations.break_minutes(),
            "focus session started"
        );
        Ok(initial)
    }

    /// Stop the running session, waiting up to the configured stop timeout.
    pub async fn stop(&self) -> Result<StopOutcome, FocusError> {
        self.stop_within(self.config.lifecycle.stop_timeout()).await
    }

    /// Stop any running session, unmute the connected group, and drop the
    /// voice connection.
    pub async fn leave(&self) -> Result<LeaveOutcome, FocusError> {
        let stopped = match self.stop_within(self.config.lifecycle.leave_timeout()).await {
            Ok(outcome) => Some(outcome),
            Err(FocusError::NotRunning) => None,
            Err(e) => return Err(e),
        };

        let group = self
            .platform
            .voice
            .connected_group()
            .await?
            .ok_or(FocusError::NotConnected)?;
        let unmuted = self.gate.apply_mute(group, false, LEAVE_REASON).await;
        self.platform.voice.disconnect().await?;
        info!(group = %group, "left voice group");
        Ok(LeaveOutcome {
            group,
            stopped,
            unmuted,
        })
    }

    /// Bring the agent into the initiator's voice group without starting a
    /// session.
    pub async fn join(&self, initiator: ParticipantId) -> Result<(GroupId, VoiceMove), FocusError> {
        let group = self
            .platform
            .roster
            .voice_group_of(initiator)
            .await?
            .ok_or(FocusError::NoVoiceContext)?;
        let moved = self.connect_to(group).await?;
        Ok((group, moved))
    }

    /// Status of the live session, if any.
    pub fn status(&self) -> Option<SessionStatus> {
        let slot = self.lock_slot();
        slot.as_ref()
            .filter(|s| !s.is_finished())
            .map(|s| s.status.borrow().clone())
    }

    /// A receiver for the live session's status updates.
    pub fn subscribe(&self) -> Option<watch::Receiver<SessionStatus>> {
        let slot = self.lock_slot();
        slot.as_ref()
            .filter(|s| !s.is_finished())
            .map(|s| s.status.clone())
    }

    /// Status of the session if it is live and has not been asked to stop.
    pub(crate) fn active_status(&self) -> Option<SessionStatus> {
        let slot = self.lock_slot();
        slot.as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.status.borrow().clone())
    }

    async fn stop_within(&self, timeout: Duration) -> Result<StopOutcome, FocusError> {
        let (id, task) = {
            let mut slot = self.lock_slot();
            if !slot.as_ref().is_some_and(|s| !s.is_finished()) {
                *slot = None;
                return Err(FocusError::NotRunning);
            }
            let Some(session) = slot.as_mut() else {
                return Err(FocusError::NotRunning);
            };
            let Some(task) = session.task.take() else {
                // another stop is already waiting on it
                return Err(FocusError::NotRunning);
            };
            session.cancel.cancel();
            (session.id, task)
        };
        info!(session = %id, "stopping focus session");

        let outcome = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(exit)) => StopOutcome::Settled(exit),
            Ok(Err(e)) => {
                warn!(session = %id, error = %e, "focus session task ended abnormally");
                StopOutcome::Settled(LoopExit::Failed(e.to_string()))
            }
            Err(_) => {
                warn!(
                    session = %id,
                    timeout_secs = timeout.as_secs(),
                    "focus session did not finish in time; cleanup continues in the background"
                );
                StopOutcome::TimedOut
            }
        };

        let mut slot = self.lock_slot();
        if slot.as_ref().is_some_and(|s| s.id == id) {
            *slot = None;
        }
        Ok(outcome)
    }

    fn ensure_idle(&self) -> Result<(), FocusError> {
        let mut slot = self.lock_slot();
        match slot.as_ref() {
            Some(session) if !session.is_finished() => Err(FocusError::AlreadyRunning),
            Some(_) => {
                *slot = None;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn connect_to(&self, group: GroupId) -> Result<VoiceMove, FocusError> {
        let voice = &self.platform.voice;
        let current = voice.connected_group().await.map_err(connect_failed)?;
        match current {
            Some(current) if current == group => Ok(VoiceMove::AlreadyThere),
            Some(current) => {
                voice.move_to(group).await.map_err(connect_failed)?;
                info!(from = %current, to = %group, "moved voice connection");
                Ok(VoiceMove::Moved)
            }
            None => {
                voice.connect(group).await.map_err(connect_failed)?;
                info!(group = %group, "connected to voice group");
                Ok(VoiceMove::Connected)
            }
        }
    }

    async fn notify(&self, channel: ChannelId, content: &str) {
        if let Err(e) = self.platform.text.send(channel, content).await {
            warn!(channel = %channel, error = %e, "failed to send message");
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn connect_failed(e: PlatformError) -> FocusError {
    warn!(error = %e, "voice connect failed");
    FocusError::VoiceConnectFailed {
        reason: ConnectFailure::from(e),
    }
}
