//! In-memory platform backend for testing.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use focus_gate_types::{ChannelId, GroupId, Participant, ParticipantId};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::PlatformError;
use crate::{AudioSink, Moderation, MuteChange, Platform, Roster, TextSink, VoiceLink};

/// How the next voice connect or move should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceFailure {
    MissingCodec,
    PermissionDenied,
    Other,
}

impl VoiceFailure {
    fn to_error(self) -> PlatformError {
        match self {
            Self::MissingCodec => PlatformError::MissingCodec,
            Self::PermissionDenied => {
                PlatformError::PermissionDenied("connect to voice group".to_string())
            }
            Self::Other => PlatformError::Service("voice gateway unavailable".to_string()),
        }
    }
}

/// Recorded mute call for test observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteCall {
    pub participant: ParticipantId,
    pub muted: bool,
    pub reason: String,
}

/// Recorded voice connection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCall {
    Connect(GroupId),
    Move(GroupId),
    Disconnect,
}

/// Recorded outgoing text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: ChannelId,
    pub content: String,
}

#[derive(Debug)]
struct MockState {
    groups: BTreeMap<GroupId, Vec<Participant>>,
    muted: HashSet<ParticipantId>,
    mute_calls: Vec<MuteCall>,
    can_mute: bool,
    denied: HashSet<ParticipantId>,
    connected: Option<GroupId>,
    voice_calls: Vec<VoiceCall>,
    voice_failure: Option<VoiceFailure>,
    voice_query_fails: bool,
    audio_enabled: bool,
    assets: HashSet<String>,
    playback_length: Duration,
    playing_until: Option<Instant>,
    plays: usize,
    playback_fails: bool,
    sent: Vec<SentMessage>,
    text_fails: bool,
    outbox: Option<mpsc::UnboundedSender<SentMessage>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            muted: HashSet::new(),
            mute_calls: Vec::new(),
            can_mute: true,
            denied: HashSet::new(),
            connected: None,
            voice_calls: Vec::new(),
            voice_failure: None,
            voice_query_fails: false,
            audio_enabled: false,
            assets: HashSet::new(),
            playback_length: Duration::from_secs(2),
            playing_until: None,
            plays: 0,
            playback_fails: false,
            sent: Vec::new(),
            text_fails: false,
            outbox: None,
        }
    }
}

impl MockState {
    fn group_of(&self, participant: ParticipantId) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|m| m.id == participant))
            .map(|(group, _)| *group)
    }

    fn remove_participant(&mut self, participant: ParticipantId) -> Option<Participant> {
        for members in self.groups.values_mut() {
            if let Some(pos) = members.iter().position(|m| m.id == participant) {
                return Some(members.remove(pos));
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// MockPlatform
// ---------------------------------------------------------------------------

/// In-memory chat platform.
///
/// Implements every boundary trait against shared state. Use
/// [`MockPlatform::handle`] to arrange scenarios and observe side effects,
/// and [`MockPlatform::platform`] to hand the backend to the core.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    /// Create an empty platform: no groups, mute capability granted, no
    /// audio connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clonable handle for arranging and observing state.
    pub fn handle(&self) -> MockPlatformHandle {
        MockPlatformHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Wrap this backend as a [`Platform`].
    pub fn platform(&self) -> Platform {
        Platform::from_backend(Arc::new(self.clone()))
    }
}

#[async_trait]
impl Roster for MockPlatform {
    async fn members(&self, group: GroupId) -> Result<Vec<Participant>, PlatformError> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.get(&group).cloned().unwrap_or_default())
    }

    async fn voice_group_of(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<GroupId>, PlatformError> {
        Ok(self.state.lock().unwrap().group_of(participant))
    }
}

#[async_trait]
impl Moderation for MockPlatform {
    async fn can_mute_members(&self, _group: GroupId) -> Result<bool, PlatformError> {
        Ok(self.state.lock().unwrap().can_mute)
    }

    async fn set_mute(
        &self,
        group: GroupId,
        participant: ParticipantId,
        muted: bool,
        reason: &str,
    ) -> Result<MuteChange, PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.denied.contains(&participant) {
            return Err(PlatformError::PermissionDenied(format!(
                "cannot change mute of {participant}"
            )));
        }
        if state.group_of(participant) != Some(group) {
            return Err(PlatformError::NotFound(format!(
                "{participant} is not in group {group}"
            )));
        }
        state.mute_calls.push(MuteCall {
            participant,
            muted,
            reason: reason.to_string(),
        });
        let changed = if muted {
            state.muted.insert(participant)
        } else {
            state.muted.remove(&participant)
        };
        Ok(if changed {
            MuteChange::Changed
        } else {
            MuteChange::Unchanged
        })
    }
}

#[async_trait]
impl VoiceLink for MockPlatform {
    async fn connected_group(&self) -> Result<Option<GroupId>, PlatformError> {
        let state = self.state.lock().unwrap();
        if state.voice_query_fails {
            return Err(PlatformError::Service("voice state unavailable".to_string()));
        }
        Ok(state.connected)
    }

    async fn connect(&self, group: GroupId) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.voice_failure {
            return Err(failure.to_error());
        }
        state.voice_calls.push(VoiceCall::Connect(group));
        state.connected = Some(group);
        Ok(())
    }

    async fn move_to(&self, group: GroupId) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.voice_failure {
            return Err(failure.to_error());
        }
        if state.connected.is_none() {
            return Err(PlatformError::NotConnected);
        }
        state.voice_calls.push(VoiceCall::Move(group));
        state.connected = Some(group);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.connected.take().is_none() {
            return Err(PlatformError::NotConnected);
        }
        state.voice_calls.push(VoiceCall::Disconnect);
        state.playing_until = None;
        Ok(())
    }
}

#[async_trait]
impl AudioSink for MockPlatform {
    async fn is_connected(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.audio_enabled && state.connected.is_some()
    }

    async fn has_asset(&self, asset: &str) -> bool {
        self.state.lock().unwrap().assets.contains(asset)
    }

    async fn play(&self, asset: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.playback_fails {
            return Err(PlatformError::Service(format!("decoder failed on {asset}")));
        }
        state.plays += 1;
        state.playing_until = Some(Instant::now() + state.playback_length);
        Ok(())
    }

    async fn stop(&self) -> Result<(), PlatformError> {
        self.state.lock().unwrap().playing_until = None;
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .playing_until
            .is_some_and(|until| Instant::now() < until)
    }
}

#[async_trait]
impl TextSink for MockPlatform {
    async fn send(&self, channel: ChannelId, content: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        if state.text_fails {
            return Err(PlatformError::PermissionDenied(format!(
                "cannot send to channel {channel}"
            )));
        }
        let message = SentMessage {
            channel,
            content: content.to_string(),
        };
        if let Some(outbox) = &state.outbox {
            let _ = outbox.send(message.clone());
        }
        state.sent.push(message);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockPlatformHandle
// ---------------------------------------------------------------------------

/// Clonable arrange/observe handle for [`MockPlatform`].
#[derive(Clone)]
pub struct MockPlatformHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatformHandle {
    /// Put `participant` into `group`, removing them from any other group.
    pub fn enter(&self, group: GroupId, participant: Participant) {
        let mut state = self.state.lock().unwrap();
        state.remove_participant(participant.id);
        state.groups.entry(group).or_default().push(participant);
    }

    /// Take `participant` out of whatever group they are in.
    pub fn exit(&self, participant: ParticipantId) -> Option<Participant> {
        self.state.lock().unwrap().remove_participant(participant)
    }

    /// Snapshot of the members of `group`.
    pub fn members(&self, group: GroupId) -> Vec<Participant> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(&group)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up a participant in any group by display name.
    pub fn find_by_name(&self, name: &str) -> Option<(GroupId, Participant)> {
        let state = self.state.lock().unwrap();
        state.groups.iter().find_map(|(group, members)| {
            members
                .iter()
                .find(|m| m.name == name)
                .map(|m| (*group, m.clone()))
        })
    }

    pub fn is_muted(&self, participant: ParticipantId) -> bool {
        self.state.lock().unwrap().muted.contains(&participant)
    }

    /// Mark a participant muted without recording a call, as if a
    /// moderator had done it by hand.
    pub fn force_mute(&self, participant: ParticipantId) {
        self.state.lock().unwrap().muted.insert(participant);
    }

    pub fn mute_calls(&self) -> Vec<MuteCall> {
        self.state.lock().unwrap().mute_calls.clone()
    }

    pub fn set_can_mute(&self, can_mute: bool) {
        self.state.lock().unwrap().can_mute = can_mute;
    }

    /// Make every mute call for `participant` fail with permission denied.
    pub fn deny_mute(&self, participant: ParticipantId) {
        self.state.lock().unwrap().denied.insert(participant);
    }

    pub fn connected_group(&self) -> Option<GroupId> {
        self.state.lock().unwrap().connected
    }

    /// Pretend the agent is already connected somewhere.
    pub fn set_connected(&self, group: Option<GroupId>) {
        self.state.lock().unwrap().connected = group;
    }

    pub fn voice_calls(&self) -> Vec<VoiceCall> {
        self.state.lock().unwrap().voice_calls.clone()
    }

    /// Make subsequent connect and move calls fail.
    pub fn fail_voice(&self, failure: Option<VoiceFailure>) {
        self.state.lock().unwrap().voice_failure = failure;
    }

    /// Make the connected-group query fail.
    pub fn fail_voice_query(&self, fails: bool) {
        self.state.lock().unwrap().voice_query_fails = fails;
    }

    /// Enable audio output and register the named asset.
    pub fn enable_audio(&self, asset: &str, playback_length: Duration) {
        let mut state = self.state.lock().unwrap();
        state.audio_enabled = true;
        state.assets.insert(asset.to_string());
        state.playback_length = playback_length;
    }

    pub fn fail_playback(&self, fails: bool) {
        self.state.lock().unwrap().playback_fails = fails;
    }

    /// Number of playbacks started.
    pub fn plays(&self) -> usize {
        self.state.lock().unwrap().plays
    }

    pub fn is_playing(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .playing_until
            .is_some_and(|until| Instant::now() < until)
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Contents of all messages sent so far, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }

    pub fn fail_text(&self, fails: bool) {
        self.state.lock().unwrap().text_fails = fails;
    }

    /// Receive a copy of every message sent from now on.
    pub fn subscribe_text(&self) -> mpsc::UnboundedReceiver<SentMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().unwrap().outbox = Some(tx);
        rx
    }
}
