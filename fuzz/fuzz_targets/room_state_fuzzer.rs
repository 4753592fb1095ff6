//! Fuzz target for the room state reducer
//!
//! Feeds arbitrary frame sequences through decode-then-apply and checks the
//! invariants the UI depends on after every step:
//!
//! - Message ids stay unique regardless of delivery order or duplication
//! - At most one in-flight streaming entry per producer
//! - The reducer never panics, whatever the event sequence

#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use quorum_core::RoomState;
use quorum_proto::decode_event;

fuzz_target!(|frames: Vec<&str>| {
    let mut state = RoomState::new();

    for (step, frame) in frames.iter().enumerate() {
        let Ok(event) = decode_event(frame) else {
            continue;
        };
        state.apply(event, step as i64);

        let mut seen = HashSet::new();
        for message in &state.messages {
            assert!(seen.insert(&message.id), "duplicate message id {:?}", message.id);
        }
        for (producer, entry) in &state.streaming {
            assert_eq!(producer, &entry.llm_id);
        }
    }
});
