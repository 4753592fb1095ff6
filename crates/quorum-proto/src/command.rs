//! Client-to-server commands.
//!
//! Each caller intent maps to exactly one [`ClientCommand`]. Commands carry
//! no client-side state and are never queued or retried; encoding happens at
//! the moment of sending.

use serde::{Deserialize, Serialize};

use crate::types::{AgentConfig, AgentPatch, ParticipantKind};

/// One outbound command on the room stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Join handshake, sent immediately after the connection opens.
    Join {
        /// Caller's stable id.
        user_id: String,
        /// Display name.
        name: String,
        /// Human or agent.
        role: ParticipantKind,
        /// Optional title.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Optional avatar reference.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar: Option<String>,
    },

    /// Post a message.
    Message {
        /// Message body.
        content: String,
        /// Ids of participants addressed with `@name`.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        mentions: Vec<String>,
        /// Message being replied to, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to: Option<String>,
    },

    /// Signal typing activity.
    Typing {
        /// True while typing.
        is_typing: bool,
    },

    /// Ask the server to cut off an in-flight agent response.
    Interrupt {
        /// Producer to interrupt.
        llm_id: String,
        /// In-flight message id, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },

    /// Attach a new agent to the room.
    AddLlm {
        /// The agent configuration.
        llm: AgentConfig,
    },

    /// Change an existing agent's configuration.
    UpdateLlm {
        /// Which agent.
        llm_id: String,
        /// Changed fields.
        #[serde(flatten)]
        patch: AgentPatch,
    },

    /// Detach an agent from the room.
    RemoveLlm {
        /// Which agent.
        llm_id: String,
    },

    /// Open a poll.
    CreatePoll {
        /// The question.
        question: String,
        /// Option texts, in display order.
        options: Vec<String>,
        /// Allow selecting multiple options.
        #[serde(default)]
        allow_multiple: bool,
        /// Hide voter identity.
        #[serde(default)]
        anonymous: bool,
        /// Expect every participant to vote.
        #[serde(default)]
        mandatory: bool,
    },

    /// Cast a ballot.
    CastVote {
        /// Which poll.
        poll_id: String,
        /// Selected options.
        option_ids: Vec<String>,
        /// Optional free-text justification.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Stop a poll from accepting votes.
    ClosePoll {
        /// Which poll.
        poll_id: String,
    },

    /// Change the room description.
    UpdateRoomDescription {
        /// New description text.
        description: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_encodes_with_snake_case_tag() {
        let cmd = ClientCommand::Join {
            user_id: "u1".into(),
            name: "Ada".into(),
            role: ParticipantKind::Human,
            title: Some("Engineer".into()),
            avatar: None,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "join");
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["role"], "human");
        assert!(json.get("avatar").is_none());
    }

    #[test]
    fn message_omits_empty_mentions() {
        let cmd =
            ClientCommand::Message { content: "hi".into(), mentions: vec![], reply_to: None };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "message");
        assert!(json.get("mentions").is_none());
        assert!(json.get("reply_to").is_none());
    }

    #[test]
    fn update_llm_flattens_patch() {
        let cmd = ClientCommand::UpdateLlm {
            llm_id: "a1".into(),
            patch: AgentPatch { persona: Some("terse".into()), ..AgentPatch::default() },
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "update_llm");
        assert_eq!(json["llm_id"], "a1");
        assert_eq!(json["persona"], "terse");
        assert!(json.get("model").is_none());
    }

    #[test]
    fn create_poll_round_trip() {
        let cmd = ClientCommand::CreatePoll {
            question: "lunch?".into(),
            options: vec!["ramen".into(), "tacos".into()],
            allow_multiple: false,
            anonymous: false,
            mandatory: true,
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn cast_vote_round_trip() {
        let cmd = ClientCommand::CastVote {
            poll_id: "p1".into(),
            option_ids: vec!["o2".into()],
            reason: Some("cheaper".into()),
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }
}
