//! Server-to-client events.
//!
//! Every inbound frame decodes to exactly one [`ServerEvent`] variant. The
//! reducer in `quorum-core` matches exhaustively over this enum, so adding a
//! variant surfaces every unhandled site at compile time instead of failing
//! silently at runtime.

use serde::{Deserialize, Serialize};

use crate::types::{
    AgentConfig, AgentPatch, Message, Participant, Poll, RoomInfo, RoomPatch, SenderRef, Vote,
};

/// Full room state sent once per connection, immediately after the join
/// handshake. Supersedes everything accumulated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Room identity.
    pub room: RoomInfo,
    /// All known participants, online or not.
    pub participants: Vec<Participant>,
    /// Recent messages, oldest first.
    pub messages: Vec<Message>,
    /// Configured agents.
    pub llms: Vec<AgentConfig>,
    /// All polls.
    pub polls: Vec<Poll>,
}

/// One inbound event on the room stream.
///
/// Frames whose `"type"` tag is not recognized decode to [`Self::Unknown`]
/// and are ignored by the reducer; frames with a known tag but missing
/// required fields fail to decode and are dropped at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Authoritative full-state snapshot.
    RoomState(RoomSnapshot),

    /// A finalized message.
    Message(Message),

    /// A participant joined (or rejoined) the room.
    UserJoined {
        /// The joining participant.
        user: Participant,
    },

    /// A participant disconnected. The record is kept, only `online` flips.
    UserLeft {
        /// Id of the departing participant.
        user_id: String,
    },

    /// An agent started preparing a response. No content yet.
    LlmThinking {
        /// Producer id.
        llm_id: String,
        /// Message the upcoming response replies to, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to: Option<String>,
    },

    /// A fragment of an agent's in-flight response.
    LlmChunk {
        /// Producer id.
        llm_id: String,
        /// Id the finalized message will carry.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        /// The fragment to append.
        content: String,
        /// Reply target, if the start signal was missed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply_to: Option<String>,
    },

    /// An agent's response is complete and should become a [`Message`].
    LlmDone {
        /// Producer id.
        llm_id: String,
        /// Id of the finalized message.
        message_id: String,
    },

    /// A participant started or stopped typing.
    Typing {
        /// Who is typing.
        user: SenderRef,
        /// True while typing.
        is_typing: bool,
    },

    /// An agent was added to the room configuration.
    LlmAdded {
        /// The new agent.
        llm: AgentConfig,
    },

    /// An agent's configuration changed. Absent fields keep their value.
    LlmUpdated {
        /// Which agent.
        llm_id: String,
        /// Changed fields.
        #[serde(flatten)]
        patch: AgentPatch,
    },

    /// An agent was removed from the room configuration.
    LlmRemoved {
        /// Which agent.
        llm_id: String,
    },

    /// A poll was opened.
    PollCreated {
        /// The new poll.
        poll: Poll,
    },

    /// A ballot was cast.
    PollVoted {
        /// Which poll.
        poll_id: String,
        /// Which option.
        option_id: String,
        /// The ballot to append.
        vote: Vote,
    },

    /// A poll stopped accepting votes.
    PollClosed {
        /// Which poll.
        poll_id: String,
    },

    /// Room name or description changed.
    RoomUpdated {
        /// Changed fields.
        room: RoomPatch,
    },

    /// Server-reported application error. Informational only.
    Error {
        /// Human-readable error text.
        error: String,
    },

    /// Heartbeat acknowledgment. Pure no-op.
    Pong,

    /// Any event kind this client does not know about.
    #[serde(other)]
    Unknown,
}
