//! Fuzz target for server event decoding
//!
//! Inbound frames are attacker-influenced text; decoding must never panic,
//! only return Err for anything that is not a well-formed event. Unknown
//! event kinds must decode to the Unknown variant rather than erroring.

#![no_main]

use libfuzzer_sys::fuzz_target;
use quorum_proto::decode_event;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Never panics; malformed input returns Err.
        let _ = decode_event(text);
    }
});
