//! Async client runtime for Quorum rooms.
//!
//! The I/O shell around the pure engine in `quorum-core`:
//!
//! - [`transport`]: one live WebSocket connection at a time, with the join
//!   handshake and a guarded send.
//! - [`RoomClient`]: the runtime that owns the event loop, drives the
//!   reconnection supervisor, merges paginated history, and publishes
//!   [`quorum_core::RoomState`] snapshots over a watch channel.
//! - [`HistoryFetcher`]: the seam to the history REST collaborator, with a
//!   reqwest implementation.
//!
//! All state transitions happen on one driver task; inbound events, command
//! requests, and history results are totally ordered through its channel,
//! so no locking guards the room state.

#![forbid(unsafe_code)]

mod client;
mod config;
mod history;
mod session;
pub mod transport;

pub use client::RoomClient;
pub use config::ClientConfig;
pub use history::{HistoryError, HistoryFetcher, RestHistoryFetcher};
pub use session::SessionContext;
