//! Streaming assembler: chunked agent output, per concurrent producer.
//!
//! Each producer id owns an independent [`StreamingEntry`] slot, so
//! arbitrarily many agents can be mid-response at once with no ordering
//! relationship between them. Entries are created by a start signal, grown
//! by appends, and destroyed exactly once: promoted into a message on
//! finalize, or discarded when the finalized message already exists (the
//! reconnect race where a snapshot materialized it first).

use quorum_proto::{Message, ParticipantKind, SenderRef};

use crate::{normalize::strip_self_prefix, state::RoomState, state::StreamingEntry};

/// Start signal: the producer is preparing a response.
///
/// Overwrites any stale entry for the same producer; a producer never has
/// two live entries.
pub(crate) fn start(state: &mut RoomState, llm_id: String, reply_to: Option<String>) {
    let entry = StreamingEntry {
        llm_id: llm_id.clone(),
        message_id: None,
        content: String::new(),
        reply_to,
        thinking: true,
    };
    if state.streaming.insert(llm_id.clone(), entry).is_some() {
        tracing::debug!(%llm_id, "overwrote stale streaming entry on start signal");
    }
}

/// Chunk signal: append one fragment to the producer's entry.
///
/// A chunk without a preceding start signal (possible across a reconnect
/// gap) creates the entry on the spot. The message id is adopted from the
/// first chunk that names it, and the reply target from the start signal is
/// preserved when the chunk omits it.
pub(crate) fn chunk(
    state: &mut RoomState,
    llm_id: &str,
    message_id: Option<String>,
    content: &str,
    reply_to: Option<String>,
) {
    let entry = state.streaming.entry(llm_id.to_string()).or_insert_with(|| StreamingEntry {
        llm_id: llm_id.to_string(),
        message_id: None,
        content: String::new(),
        reply_to: None,
        thinking: true,
    });

    entry.content.push_str(content);
    if entry.message_id.is_none() {
        entry.message_id = message_id;
    }
    if entry.reply_to.is_none() {
        entry.reply_to = reply_to;
    }
    // Content flowing means the preparation phase is over, even if more
    // chunks are still coming.
    if !entry.content.is_empty() {
        entry.thinking = false;
    }
}

/// Finalize signal: promote the producer's entry into a permanent message.
///
/// Stale signals (no live entry) are dropped; `llm_done` carries no content,
/// so there is nothing to reconstruct from. When a message with the carried
/// id already exists, only the entry is discarded — the message is never
/// appended twice.
pub(crate) fn finalize(state: &mut RoomState, llm_id: &str, message_id: &str, now_ms: i64) {
    let Some(entry) = state.streaming.remove(llm_id) else {
        tracing::warn!(%llm_id, %message_id, "dropping finalize signal with no streaming entry");
        return;
    };

    if state.contains_message(message_id) {
        tracing::debug!(%llm_id, %message_id, "finalized message already present, entry discarded");
        return;
    }

    let sender_name = state.display_name(llm_id).unwrap_or(llm_id).to_string();
    let content = strip_self_prefix(&sender_name, &entry.content);

    state.messages.push(Message {
        id: message_id.to_string(),
        sender: SenderRef { id: llm_id.to_string(), kind: ParticipantKind::Agent },
        content,
        reply_to: entry.reply_to,
        timestamp: now_ms,
        poll_id: None,
    });
}
