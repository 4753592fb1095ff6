//! WebSocket transport connector.
//!
//! Owns exactly one live connection. [`connect`] dials the room endpoint,
//! performs the join handshake, and returns a [`Connection`] handle backed
//! by two tasks: a reader that decodes inbound text frames into
//! [`ServerEvent`]s, and a writer that drains the outbound queue. Malformed
//! frames are logged and dropped at this boundary; they never reach the
//! reducer.
//!
//! The send path is guarded: once the socket closes, [`Connection::send`]
//! becomes a silent no-op. Commands issued while disconnected are dropped
//! by design — the caller gates interactive controls on connection state.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures_util::{SinkExt, StreamExt};
use quorum_proto::{ClientCommand, ServerEvent, decode_event, encode_command};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Dialing the endpoint failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The join handshake could not be sent.
    #[error("join handshake failed: {0}")]
    Handshake(String),
}

/// Handle to one live room connection.
///
/// Dropping the handle aborts both I/O tasks.
pub struct Connection {
    events: mpsc::Receiver<ServerEvent>,
    outbound: mpsc::UnboundedSender<WsMessage>,
    open: Arc<AtomicBool>,
    reader: tokio::task::AbortHandle,
    writer: tokio::task::AbortHandle,
}

impl Connection {
    /// Next inbound event. `None` means the connection is closed.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }

    /// Whether the socket is still open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Send one command, or silently drop it if the connection is not open.
    pub fn send(&self, command: &ClientCommand) {
        if !self.is_open() {
            tracing::debug!("dropping command: connection not open");
            return;
        }
        let text = match encode_command(command) {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(%error, "failed to encode command");
                return;
            },
        };
        if self.outbound.send(WsMessage::Text(text.into())).is_err() {
            // Writer task is gone; the socket is effectively closed.
            self.open.store(false, Ordering::SeqCst);
            tracing::debug!("dropping command: writer stopped");
        }
    }

    /// Close the connection. Used for intentional disconnects; the caller
    /// tracks intent, the transport only tears down.
    pub fn shutdown(&self) {
        self.open.store(false, Ordering::SeqCst);
        let _ = self.outbound.send(WsMessage::Close(None));
        self.reader.abort();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Dial the room endpoint and perform the join handshake.
///
/// The join command is the first frame on the wire; the server answers with
/// a full state snapshot, which arrives through [`Connection::recv`] like
/// any other event.
pub async fn connect(url: &str, join: &ClientCommand) -> Result<Connection, TransportError> {
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;
    tracing::debug!(url, "websocket open");

    let (mut sink, mut stream) = ws.split();

    let text = encode_command(join).map_err(|e| TransportError::Handshake(e.to_string()))?;
    sink.send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| TransportError::Handshake(e.to_string()))?;

    let open = Arc::new(AtomicBool::new(true));
    let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(64);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsMessage>();

    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let closing = matches!(message, WsMessage::Close(_));
            if sink.send(message).await.is_err() {
                break;
            }
            if closing {
                break;
            }
        }
    });

    let reader_open = Arc::clone(&open);
    let reader = tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(WsMessage::Text(text)) => match decode_event(text.as_str()) {
                    Ok(event) => {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    },
                    Err(error) => {
                        tracing::warn!(%error, "dropping malformed frame");
                    },
                },
                Ok(WsMessage::Close(_)) => break,
                // Ping/pong are handled by tungstenite; binary is not part
                // of this protocol.
                Ok(_) => {},
                Err(error) => {
                    tracing::debug!(%error, "socket read error");
                    break;
                },
            }
        }
        reader_open.store(false, Ordering::SeqCst);
        // event_tx drops here; the receiver sees the stream end.
    });

    Ok(Connection {
        events: event_rx,
        outbound: out_tx,
        open,
        reader: reader.abort_handle(),
        writer: writer.abort_handle(),
    })
}
