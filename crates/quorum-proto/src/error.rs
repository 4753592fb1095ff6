//! Protocol errors and frame codec helpers.
//!
//! A frame that fails to decode is malformed by definition; the caller logs
//! and drops it without mutating state (the boundary never propagates
//! half-parsed data inward).

use thiserror::Error;

use crate::{ClientCommand, ServerEvent};

/// Errors produced by the wire codec.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame text is not a valid event or command of the expected shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode an inbound frame into a [`ServerEvent`].
///
/// Unrecognized `"type"` tags succeed as [`ServerEvent::Unknown`]; anything
/// structurally invalid is an error.
pub fn decode_event(text: &str) -> Result<ServerEvent, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode an outbound [`ClientCommand`] as frame text.
pub fn encode_command(command: &ClientCommand) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(command)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_garbage_is_malformed() {
        assert!(decode_event("not json at all").is_err());
    }

    #[test]
    fn decode_wrong_shape_is_malformed() {
        // Valid JSON, but no type tag.
        assert!(decode_event(r#"{"content": "hi"}"#).is_err());
    }

    #[test]
    fn encode_then_decode_command_as_event_fails() {
        // A typing command shares its tag with the typing event but lacks
        // the user object, so it must not decode as a ServerEvent.
        let text =
            encode_command(&ClientCommand::Typing { is_typing: true }).unwrap();
        assert!(decode_event(&text).is_err());
    }
}
