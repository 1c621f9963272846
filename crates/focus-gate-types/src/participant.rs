//! Participant descriptor types.

use serde::{Deserialize, Serialize};

/// Platform identifier of a member who can sit in a voice group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member of a voice group.
///
/// Mute state is owned by the platform and is never cached here; it is
/// read and written through the moderation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Display name, used in log lines only.
    pub name: String,
    /// Bots are exempt from muting.
    pub is_bot: bool,
}

impl Participant {
    /// A human participant.
    pub fn member(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id),
            name: name.into(),
            is_bot: false,
        }
    }

    /// A bot participant.
    pub fn bot(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id),
            name: name.into(),
            is_bot: true,
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
