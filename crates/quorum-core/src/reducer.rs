//! The event reducer.
//!
//! [`RoomState::apply`] folds one inbound event at a time into the state.
//! It is deterministic and I/O-free: the caller supplies the current time,
//! and the same event sequence always yields the same state. Events fall
//! into six families — snapshot, message lifecycle, presence, streaming
//! lifecycle, configuration, poll — plus ambient signals (typing, error,
//! heartbeat ack).
//!
//! Duplicate message ids are ignored rather than re-appended; this is the
//! primary reconnect-race guard, since a message already delivered inside a
//! snapshot must not be appended again from a live event.

use std::collections::HashSet;

use quorum_proto::{AgentConfig, AgentPatch, Poll, PollStatus, RoomSnapshot, ServerEvent};

use crate::{normalize::strip_self_prefix, state::RoomState, streaming};

impl RoomState {
    /// Apply one inbound event, producing the next state.
    ///
    /// `now_ms` (milliseconds since the Unix epoch) stamps messages the
    /// reducer constructs itself, such as finalized streaming output.
    /// Unknown event kinds are ignored for forward compatibility.
    pub fn apply(&mut self, event: ServerEvent, now_ms: i64) {
        match event {
            ServerEvent::RoomState(snapshot) => self.apply_snapshot(snapshot),

            ServerEvent::Message(mut message) => {
                if self.contains_message(&message.id) {
                    tracing::debug!(id = %message.id, "ignoring duplicate message");
                    return;
                }
                if let Some(name) = self.display_name(&message.sender.id) {
                    message.content = strip_self_prefix(name, &message.content);
                }
                self.messages.push(message);
            },

            ServerEvent::UserJoined { user } => {
                let mut user = user;
                user.online = true;
                match self.participants.get_mut(&user.id) {
                    Some(existing) => *existing = user,
                    None => {
                        self.participants.insert(user.id.clone(), user);
                    },
                }
            },

            ServerEvent::UserLeft { user_id } => {
                // Soft-offline only: the log may still reference this id.
                if let Some(participant) = self.participants.get_mut(&user_id) {
                    participant.online = false;
                }
                self.typing.remove(&user_id);
            },

            ServerEvent::LlmThinking { llm_id, reply_to } => {
                streaming::start(self, llm_id, reply_to);
            },

            ServerEvent::LlmChunk { llm_id, message_id, content, reply_to } => {
                streaming::chunk(self, &llm_id, message_id, &content, reply_to);
            },

            ServerEvent::LlmDone { llm_id, message_id } => {
                streaming::finalize(self, &llm_id, &message_id, now_ms);
            },

            ServerEvent::Typing { user, is_typing } => {
                if is_typing {
                    self.typing.insert(user.id);
                } else {
                    self.typing.remove(&user.id);
                }
            },

            ServerEvent::LlmAdded { llm } => {
                self.agents.insert(llm.id.clone(), llm);
            },

            ServerEvent::LlmUpdated { llm_id, patch } => {
                if let Some(agent) = self.agents.get_mut(&llm_id) {
                    apply_agent_patch(agent, patch);
                } else {
                    tracing::debug!(%llm_id, "update for unknown agent ignored");
                }
            },

            ServerEvent::LlmRemoved { llm_id } => {
                self.agents.remove(&llm_id);
                // A removed agent can no longer finish its response.
                self.streaming.remove(&llm_id);
            },

            ServerEvent::PollCreated { poll } => {
                if self.polls.iter().any(|p| p.id == poll.id) {
                    tracing::debug!(id = %poll.id, "ignoring duplicate poll");
                    return;
                }
                self.polls.push(poll);
            },

            ServerEvent::PollVoted { poll_id, option_id, vote } => {
                let Some(poll) = self.polls.iter_mut().find(|p| p.id == poll_id) else {
                    tracing::debug!(%poll_id, "vote for unknown poll ignored");
                    return;
                };
                let Some(option) = poll.options.iter_mut().find(|o| o.id == option_id) else {
                    tracing::debug!(%poll_id, %option_id, "vote for unknown option ignored");
                    return;
                };
                // Append-only ballot: prior votes are never removed or
                // replaced.
                option.votes.push(vote);
            },

            ServerEvent::PollClosed { poll_id } => {
                if let Some(poll) = self.polls.iter_mut().find(|p| p.id == poll_id) {
                    poll.status = PollStatus::Closed;
                }
            },

            ServerEvent::RoomUpdated { room: patch } => {
                if let Some(room) = self.room.as_mut() {
                    if let Some(name) = patch.name {
                        room.name = name;
                    }
                    if let Some(description) = patch.description {
                        room.description = Some(description);
                    }
                }
            },

            ServerEvent::Error { error } => {
                self.connection.last_error = Some(error);
            },

            ServerEvent::Pong => {},

            ServerEvent::Unknown => {
                tracing::debug!("ignoring unknown event kind");
            },
        }
    }

    /// Replace room, participants, messages, agents, and polls wholesale.
    ///
    /// Sent once per connection to reestablish ground truth; everything
    /// accumulated locally for those collections is superseded. Streaming
    /// entries are kept — chunks for a response that straddles the gap may
    /// still arrive, and finalize dedups against the snapshot's messages.
    /// Typing indicators are cleared: they are ephemeral, the snapshot
    /// carries none, and any still live are re-signalled.
    ///
    /// Snapshot messages go through the same ingestion rules as live ones:
    /// a repeated id within the payload keeps the first occurrence only,
    /// and content is normalized against the snapshot's own participant and
    /// agent names.
    fn apply_snapshot(&mut self, snapshot: RoomSnapshot) {
        self.room = Some(snapshot.room);
        self.participants =
            snapshot.participants.into_iter().map(|p| (p.id.clone(), p)).collect();
        self.agents = snapshot.llms.into_iter().map(|a| (a.id.clone(), a)).collect();
        // Typing indicators from before the snapshot are stale; the new
        // connection re-signals any that are still live.
        self.typing.clear();

        let mut seen = HashSet::new();
        let mut messages = Vec::with_capacity(snapshot.messages.len());
        for mut message in snapshot.messages {
            if !seen.insert(message.id.clone()) {
                tracing::debug!(id = %message.id, "dropping duplicate message in snapshot");
                continue;
            }
            if let Some(name) = self.display_name(&message.sender.id) {
                message.content = strip_self_prefix(name, &message.content);
            }
            messages.push(message);
        }
        self.messages = messages;
        self.polls = snapshot.polls;
    }
}

/// Merge a partial agent update, preserving unset fields.
fn apply_agent_patch(agent: &mut AgentConfig, patch: AgentPatch) {
    let AgentPatch { name, provider, model, persona, title, avatar } = patch;
    if let Some(name) = name {
        agent.name = name;
    }
    if let Some(provider) = provider {
        agent.provider = provider;
    }
    if let Some(model) = model {
        agent.model = model;
    }
    if let Some(persona) = persona {
        agent.persona = Some(persona);
    }
    if let Some(title) = title {
        agent.title = Some(title);
    }
    if let Some(avatar) = avatar {
        agent.avatar = Some(avatar);
    }
}

/// Poll lookup helper used by tests and UI code.
pub fn find_poll<'a>(state: &'a RoomState, poll_id: &str) -> Option<&'a Poll> {
    state.polls.iter().find(|p| p.id == poll_id)
}
