//! Shared types for focus-gate.
//!
//! This crate contains the value types shared across the focus-gate
//! workspace: group and channel identifiers, participants, voice state
//! transitions, session phases and durations.

pub mod group;
pub mod participant;
pub mod phase;
pub mod session;

pub use group::{ChannelId, GroupId, VoiceStateChange};
pub use participant::{Participant, ParticipantId};
pub use phase::{Phase, PhaseDurations};
pub use session::SessionId;
