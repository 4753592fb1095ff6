//! Pure synchronization engine for Quorum rooms.
//!
//! This crate holds everything with real invariants and none of the I/O:
//! the [`RoomState`] aggregate, the event reducer that folds inbound
//! [`quorum_proto::ServerEvent`]s into it, the streaming assembler that
//! accumulates concurrent agent output, the history merge logic, and the
//! reconnection supervisor state machine.
//!
//! Everything here is deterministic. Time is passed in as a parameter where
//! needed, never sampled, so the same event sequence always produces the
//! same state. The I/O shell lives in `quorum-client`.

mod history;
mod normalize;
mod reducer;
mod state;
mod streaming;
mod supervisor;

pub use normalize::strip_self_prefix;
pub use reducer::find_poll;
pub use state::{ConnectionStatus, HistoryState, RoomState, StreamingEntry};
pub use supervisor::{Phase, ReconnectConfig, Supervisor, SupervisorAction, retry_delay};
