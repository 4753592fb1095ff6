//! Caller identity for the join handshake.

use quorum_proto::{ClientCommand, ParticipantKind};

/// Immutable session context: who is joining the room.
///
/// Passed by value into every (re)connect so reconnection replays the same
/// handshake. Deliberately a plain value rather than state captured in a
/// closure; the reconnect driver receives it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Stable caller id.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Human or agent.
    pub role: ParticipantKind,
    /// Optional title.
    pub title: Option<String>,
    /// Optional avatar reference.
    pub avatar: Option<String>,
}

impl SessionContext {
    /// Context for a human caller with no title or avatar.
    pub fn human(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role: ParticipantKind::Human,
            title: None,
            avatar: None,
        }
    }

    /// The join command this identity sends right after the socket opens.
    pub fn join_command(&self) -> ClientCommand {
        ClientCommand::Join {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            role: self.role,
            title: self.title.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_command_carries_full_identity() {
        let session = SessionContext {
            title: Some("Moderator".into()),
            ..SessionContext::human("u1", "Ada")
        };
        match session.join_command() {
            ClientCommand::Join { user_id, name, role, title, avatar } => {
                assert_eq!(user_id, "u1");
                assert_eq!(name, "Ada");
                assert_eq!(role, ParticipantKind::Human);
                assert_eq!(title.as_deref(), Some("Moderator"));
                assert!(avatar.is_none());
            },
            other => panic!("expected join, got {other:?}"),
        }
    }
}
