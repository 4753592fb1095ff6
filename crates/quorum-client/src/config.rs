//! Client configuration.

use quorum_core::ReconnectConfig;

/// Default history page size.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Endpoints and tuning for one room client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Room-scoped WebSocket endpoint, e.g. `ws://host/rooms/r1/stream`.
    pub ws_url: String,
    /// Room-scoped history REST endpoint, e.g. `http://host/rooms/r1/messages`.
    pub history_url: String,
    /// Fixed page size for history fetches.
    pub page_size: u32,
    /// Backoff parameters for the reconnection supervisor.
    pub reconnect: ReconnectConfig,
}

impl ClientConfig {
    /// Config with default tuning for the given endpoints.
    pub fn new(ws_url: impl Into<String>, history_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            history_url: history_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            reconnect: ReconnectConfig::default(),
        }
    }
}
