//! Voice group and text channel identifiers.

use serde::{Deserialize, Serialize};

use crate::participant::Participant;

/// Identifier of a real-time voice group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a text channel that receives announcements and replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant's voice presence changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStateChange {
    pub participant: Participant,
    /// Group the participant was in before the change, if any.
    pub before: Option<GroupId>,
    /// Group the participant is in after the change, if any.
    pub after: Option<GroupId>,
}

impl VoiceStateChange {
    /// Whether this change brings the participant into `group` from
    /// somewhere else (including from no group at all).
    #[must_use]
    pub fn enters(&self, group: GroupId) -> bool {
        self.after == Some(group) && self.before != Some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(before: Option<u64>, after: Option<u64>) -> VoiceStateChange {
        VoiceStateChange {
            participant: Participant::member(1, "alice"),
            before: before.map(GroupId),
            after: after.map(GroupId),
        }
    }

    #[test]
    fn joining_from_nowhere_enters() {
        assert!(change(None, Some(7)).enters(GroupId(7)));
    }

    #[test]
    fn moving_in_from_another_group_enters() {
        assert!(change(Some(3), Some(7)).enters(GroupId(7)));
    }

    #[test]
    fn staying_in_group_does_not_enter() {
        // e.g. a self-mute toggle inside the same group
        assert!(!change(Some(7), Some(7)).enters(GroupId(7)));
    }

    #[test]
    fn leaving_or_other_group_does_not_enter() {
        assert!(!change(Some(7), None).enters(GroupId(7)));
        assert!(!change(None, Some(3)).enters(GroupId(7)));
    }

    #[test]
    fn group_ids_order_numerically() {
        let mut groups = std::collections::BTreeSet::new();
        groups.extend([GroupId(200), GroupId(7), GroupId(100)]);
        let ordered: Vec<_> = groups.into_iter().collect();
        assert_eq!(ordered, vec![GroupId(7), GroupId(100), GroupId(200)]);
    }
}
