//! Wire protocol for the Quorum room stream.
//!
//! Every value that travels over the persistent room connection is defined
//! here: the tagged server-to-client event union ([`ServerEvent`]), the
//! client-to-server command union ([`ClientCommand`]), and the data model
//! they carry (participants, messages, agent configurations, polls).
//!
//! The wire format is JSON with an internal `"type"` tag in `snake_case`.
//! Decoding is strict: a frame with missing required fields is rejected as
//! malformed rather than half-parsed, while a frame whose `"type"` tag is
//! unrecognized decodes to [`ServerEvent::Unknown`] so newer servers do not
//! break older clients.

mod command;
mod error;
mod event;
mod types;

pub use command::ClientCommand;
pub use error::{ProtocolError, decode_event, encode_command};
pub use event::{RoomSnapshot, ServerEvent};
pub use types::{
    AgentConfig, AgentPatch, HistoryPage, Message, Participant, ParticipantKind, Poll, PollOption,
    PollStatus, RoomInfo, RoomPatch, SenderRef, Vote,
};
