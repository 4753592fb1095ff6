//! History merge logic.
//!
//! The paginator in `quorum-client` fetches pages; the pure merge lives
//! here so the overlap guarantees are testable without a network. Pages
//! arrive in chronological ascending order and are prepended at the head of
//! the log, minus any message already delivered live.

use std::collections::HashSet;

use quorum_proto::HistoryPage;

use crate::{normalize::strip_self_prefix, state::RoomState};

impl RoomState {
    /// Take the in-flight guard for a history fetch.
    ///
    /// Returns `false` — and changes nothing — if a fetch is already in
    /// flight or no older history remains. The caller must follow up with
    /// either [`Self::merge_history`] or [`Self::history_fetch_failed`].
    pub fn begin_history_fetch(&mut self) -> bool {
        if self.history.loading || !self.history.has_more {
            return false;
        }
        self.history.loading = true;
        true
    }

    /// Merge one fetched page into the message log.
    ///
    /// Messages whose id is already present are dropped (overlap between
    /// live-streamed and paginated delivery), as is any repeat of an id
    /// within the page itself; the remainder is normalized against known
    /// sender names and prepended at the head. Adopts the returned cursor
    /// and clears the in-flight guard.
    pub fn merge_history(&mut self, page: HistoryPage) {
        let mut seen = HashSet::new();
        let mut fresh = Vec::with_capacity(page.messages.len());
        for mut message in page.messages {
            if self.contains_message(&message.id) || !seen.insert(message.id.clone()) {
                continue;
            }
            if let Some(name) = self.display_name(&message.sender.id) {
                message.content = strip_self_prefix(name, &message.content);
            }
            fresh.push(message);
        }

        if !fresh.is_empty() {
            let mut merged = fresh;
            merged.append(&mut self.messages);
            self.messages = merged;
        }

        self.history.has_more = page.next_cursor.is_some();
        self.history.cursor = page.next_cursor;
        self.history.loading = false;
    }

    /// Record a failed fetch: clear the guard, touch nothing else, so the
    /// caller may retry with the same cursor.
    pub fn history_fetch_failed(&mut self) {
        self.history.loading = false;
    }
}
