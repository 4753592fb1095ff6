//! Observable room state.
//!
//! [`RoomState`] is the single owned aggregate the engine maintains. The UI
//! layer reads cloned snapshots of it and never mutates it directly; every
//! transition goes through [`RoomState::apply`] or one of the explicit
//! connection/history methods.

use std::collections::{BTreeMap, BTreeSet};

use quorum_proto::{AgentConfig, Message, Participant, Poll, RoomInfo};

/// In-flight, not-yet-finalized output from one producer.
///
/// Created by a start signal, grown by chunk appends, and destroyed exactly
/// once: promoted into a [`Message`] on finalize or discarded when a
/// duplicate already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingEntry {
    /// Producer (agent) id. At most one live entry per producer.
    pub llm_id: String,
    /// Id the finalized message will carry. Unknown until the first chunk
    /// that names it.
    pub message_id: Option<String>,
    /// Accumulated content. Grows monotonically, never replaced.
    pub content: String,
    /// Message the response replies to, carried from the start signal.
    pub reply_to: Option<String>,
    /// True while the producer has signalled activity but delivered no
    /// content yet. Flips false on the first appended fragment.
    pub thinking: bool,
}

/// Connection lifecycle as seen by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// A connection is currently open.
    pub connected: bool,
    /// At least one connection has ever opened. Lets the UI distinguish an
    /// initial-connect spinner from a reconnect banner.
    pub ever_connected: bool,
    /// The supervisor is between attempts.
    pub reconnecting: bool,
    /// Consecutive failed attempts. Zero while connected.
    pub attempt: u32,
    /// Most recent user-visible error, if any.
    pub last_error: Option<String>,
}

impl ConnectionStatus {
    /// Record a successful open. Resets the attempt count and clears the
    /// error.
    pub fn opened(&mut self) {
        self.connected = true;
        self.ever_connected = true;
        self.reconnecting = false;
        self.attempt = 0;
        self.last_error = None;
    }

    /// Record an unintentional loss; a retry is scheduled as `attempt`.
    pub fn lost(&mut self, attempt: u32) {
        self.connected = false;
        self.reconnecting = true;
        self.attempt = attempt;
    }

    /// Record an intentional disconnect.
    pub fn closed(&mut self) {
        self.connected = false;
        self.reconnecting = false;
        self.attempt = 0;
    }

    /// Record retry-budget exhaustion with a fatal, user-visible error.
    pub fn exhausted(&mut self, error: impl Into<String>) {
        self.connected = false;
        self.reconnecting = false;
        self.last_error = Some(error.into());
    }
}

/// Cursor-based history pagination state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryState {
    /// Opaque server-issued cursor for the next older page.
    pub cursor: Option<String>,
    /// Whether older history may remain. Optimistically true until the
    /// server returns a page without a next cursor.
    pub has_more: bool,
    /// Mutual-exclusion guard: a fetch is in flight.
    pub loading: bool,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self { cursor: None, has_more: true, loading: false }
    }
}

/// The local, consistent view of one collaboration room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomState {
    /// Room identity. Absent until the first snapshot.
    pub room: Option<RoomInfo>,
    /// Participant id to record. Entries are never removed, only toggled
    /// offline, so the log can always resolve a sender's name.
    pub participants: BTreeMap<String, Participant>,
    /// Messages in chronological ascending order, unique by id. Live events
    /// append at the tail; paginated history prepends at the head.
    pub messages: Vec<Message>,
    /// Producer id to in-flight entry. A producer never has more than one.
    pub streaming: BTreeMap<String, StreamingEntry>,
    /// Ids currently signalling typing activity. Cleared by an explicit
    /// `is_typing: false`, by the sender leaving, or by a snapshot; there
    /// is no engine-side expiry timer.
    pub typing: BTreeSet<String>,
    /// Agent id to configuration.
    pub agents: BTreeMap<String, AgentConfig>,
    /// All polls, in creation order.
    pub polls: Vec<Poll>,
    /// Connection lifecycle.
    pub connection: ConnectionStatus,
    /// History pagination.
    pub history: HistoryState,
}

impl RoomState {
    /// Empty state, disconnected, no snapshot received.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a message with this id is already in the log.
    pub fn contains_message(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// Resolve a participant or agent id to its display name, if known.
    pub fn display_name(&self, id: &str) -> Option<&str> {
        if let Some(agent) = self.agents.get(id) {
            return Some(&agent.name);
        }
        self.participants.get(id).map(|p| p.name.as_str())
    }
}
