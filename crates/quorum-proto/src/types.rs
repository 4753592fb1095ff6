//! Data model shared by events, commands, and the history endpoint.
//!
//! These are plain serde structs. Identity is string-keyed throughout: the
//! server issues participant, message, agent, and poll ids as opaque strings
//! and the client never interprets them beyond equality.

use serde::{Deserialize, Serialize};

/// Whether a participant is a human or an autonomous agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    /// A human user.
    Human,
    /// An LLM-backed agent.
    Agent,
}

/// Identity and display metadata for one room member.
///
/// Participants are never deleted client-side. When a member disconnects the
/// `online` flag flips to `false` so stored messages can still resolve the
/// sender's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable participant id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Human or agent.
    pub kind: ParticipantKind,
    /// Optional title shown beside the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Whether the participant is currently connected.
    #[serde(default)]
    pub online: bool,
}

/// Lightweight reference to a message sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderRef {
    /// Participant or agent id.
    pub id: String,
    /// Human or agent.
    pub kind: ParticipantKind,
}

/// A finalized chat message.
///
/// Immutable once constructed; the client never edits or removes messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Globally unique message id.
    pub id: String,
    /// Who sent it.
    pub sender: SenderRef,
    /// Message body, already normalized at ingestion.
    pub content: String,
    /// Id of the message this replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Id of an embedded poll, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_id: Option<String>,
}

/// Identity and description of the room itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Room id.
    pub id: String,
    /// Room name.
    pub name: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial room update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPatch {
    /// New room name, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Configuration for one agent attached to the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent id, used as the producer id in streaming events.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Inference provider.
    pub provider: String,
    /// Model identifier at the provider.
    pub model: String,
    /// System persona text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    /// Optional title shown beside the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Partial agent update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPatch {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// New model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// New persona text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One recorded ballot on a poll option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Who voted.
    pub voter_id: String,
    /// Optional free-text justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// One selectable poll option with its accumulated ballots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option id within the poll.
    pub id: String,
    /// Option text.
    pub text: String,
    /// Votes cast for this option, append-only.
    #[serde(default)]
    pub votes: Vec<Vote>,
}

/// Whether a poll still accepts votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    /// Accepting votes.
    #[default]
    Open,
    /// Voting ended.
    Closed,
}

/// A structured multi-option vote embedded in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Poll id.
    pub id: String,
    /// Who created the poll.
    pub creator: SenderRef,
    /// The question being asked.
    pub question: String,
    /// Ordered options.
    pub options: Vec<PollOption>,
    /// Whether a voter may select multiple options.
    #[serde(default)]
    pub allow_multiple: bool,
    /// Whether votes are shown without voter identity.
    #[serde(default)]
    pub anonymous: bool,
    /// Whether every participant is expected to vote.
    #[serde(default)]
    pub mandatory: bool,
    /// Open or closed.
    #[serde(default)]
    pub status: PollStatus,
}

/// One page returned by the history REST endpoint.
///
/// Messages arrive in chronological ascending order. A missing `next_cursor`
/// means no older history remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    /// Messages in this page, oldest first.
    pub messages: Vec<Message>,
    /// Cursor for the next older page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
