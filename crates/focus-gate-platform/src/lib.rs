//! Chat platform boundary for focus-gate.
//!
//! This crate defines the traits the core calls into: [`Roster`] for group
//! membership, [`Moderation`] for server-side mute, [`VoiceLink`] for the
//! agent's own voice connection, [`AudioSink`] for alert playback and
//! [`TextSink`] for channel messages. A concrete chat-service backend
//! implements them; the `mock` feature provides an in-memory one for tests
//! and the console driver.

use std::sync::Arc;

use async_trait::async_trait;
use focus_gate_types::{ChannelId, GroupId, Participant, ParticipantId};

pub mod error;
#[cfg(feature = "mock")]
pub mod mock;

pub use error::PlatformError;

/// Whether a mute call actually changed the participant's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteChange {
    Changed,
    Unchanged,
}

/// Live group membership.
#[async_trait]
pub trait Roster: Send + Sync + 'static {
    /// Current members of `group`, bots included. Fetched fresh on every
    /// call; callers must not cache the result across phases.
    async fn members(&self, group: GroupId) -> Result<Vec<Participant>, PlatformError>;

    /// The voice group `participant` currently sits in, if any.
    async fn voice_group_of(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<GroupId>, PlatformError>;
}

/// Server-side mute of group members.
#[async_trait]
pub trait Moderation: Send + Sync + 'static {
    /// Whether the acting agent holds the mute-members capability in `group`.
    async fn can_mute_members(&self, group: GroupId) -> Result<bool, PlatformError>;

    /// Set the mute state of one participant, attaching `reason` to the
    /// platform's audit log.
    ///
    /// Fails with [`PlatformError::PermissionDenied`] when the platform
    /// refuses this particular participant.
    async fn set_mute(
        &self,
        group: GroupId,
        participant: ParticipantId,
        muted: bool,
        reason: &str,
    ) -> Result<MuteChange, PlatformError>;
}

/// The acting agent's own voice connection.
///
/// Connection failures distinguish [`PlatformError::MissingCodec`],
/// [`PlatformError::PermissionDenied`] and everything else.
#[async_trait]
pub trait VoiceLink: Send + Sync + 'static {
    /// The group the agent is connected to, if any.
    async fn connected_group(&self) -> Result<Option<GroupId>, PlatformError>;

    /// Connect to `group` when not connected anywhere.
    async fn connect(&self, group: GroupId) -> Result<(), PlatformError>;

    /// Move an existing connection to `group`.
    async fn move_to(&self, group: GroupId) -> Result<(), PlatformError>;

    /// Drop the voice connection.
    async fn disconnect(&self) -> Result<(), PlatformError>;
}

/// Playback of named local audio assets over the voice connection.
///
/// A missing asset or a missing audio connection is not an error; callers
/// check [`AudioSink::is_connected`] and [`AudioSink::has_asset`] first.
#[async_trait]
pub trait AudioSink: Send + Sync + 'static {
    /// Whether an audio-capable connection is up.
    async fn is_connected(&self) -> bool;

    /// Whether the named asset exists locally.
    async fn has_asset(&self, asset: &str) -> bool;

    /// Start playing `asset`. Returns once playback has started.
    async fn play(&self, asset: &str) -> Result<(), PlatformError>;

    /// Stop whatever is playing.
    async fn stop(&self) -> Result<(), PlatformError>;

    /// Whether playback is still in progress.
    async fn is_playing(&self) -> bool;
}

/// Fire-and-forget text messages.
#[async_trait]
pub trait TextSink: Send + Sync + 'static {
    async fn send(&self, channel: ChannelId, content: &str) -> Result<(), PlatformError>;
}

/// The full set of collaborators the core depends on.
#[derive(Clone)]
pub struct Platform {
    pub roster: Arc<dyn Roster>,
    pub moderation: Arc<dyn Moderation>,
    pub voice: Arc<dyn VoiceLink>,
    pub audio: Arc<dyn AudioSink>,
    pub text: Arc<dyn TextSink>,
}

impl Platform {
    /// Build a platform whose every capability is served by one backend.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: Roster + Moderation + VoiceLink + AudioSink + TextSink,
    {
        Self {
            roster: backend.clone(),
            moderation: backend.clone(),
            voice: backend.clone(),
            audio: backend.clone(),
            text: backend,
        }
    }
}
