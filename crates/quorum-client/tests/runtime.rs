//! End-to-end runtime tests: a [`RoomClient`] against scripted in-process
//! servers, covering reconnection, intentional disconnect, and history.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use quorum_client::{ClientConfig, HistoryError, HistoryFetcher, RoomClient, SessionContext};
use quorum_core::{ReconnectConfig, RoomState};
use quorum_proto::{
    HistoryPage, Message, ParticipantKind, RoomInfo, RoomSnapshot, SenderRef, ServerEvent,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Notify, watch},
};
use tokio_tungstenite::{WebSocketStream, tungstenite::Message as WsMessage};

type ServerSocket = WebSocketStream<TcpStream>;

fn message(id: &str, timestamp: i64) -> Message {
    Message {
        id: id.into(),
        sender: SenderRef { id: "u1".into(), kind: ParticipantKind::Human },
        content: format!("msg {id}"),
        reply_to: None,
        timestamp,
        poll_id: None,
    }
}

fn snapshot(messages: Vec<Message>) -> ServerEvent {
    ServerEvent::RoomState(RoomSnapshot {
        room: RoomInfo { id: "r1".into(), name: "standup".into(), description: None },
        participants: vec![],
        messages,
        llms: vec![],
        polls: vec![],
    })
}

async fn read_text(ws: &mut ServerSocket) -> Option<String> {
    loop {
        match ws.next().await?.ok()? {
            WsMessage::Text(text) => return Some(text.to_string()),
            WsMessage::Close(_) => return None,
            _ => {},
        }
    }
}

async fn send_event(ws: &mut ServerSocket, event: &ServerEvent) {
    let text = serde_json::to_string(event).unwrap();
    ws.send(WsMessage::Text(text.into())).await.unwrap();
}

fn fast_config(ws_url: String) -> ClientConfig {
    ClientConfig {
        reconnect: ReconnectConfig {
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            max_attempts: 10,
        },
        ..ClientConfig::new(ws_url, "http://127.0.0.1:1/unused")
    }
}

async fn wait_for<F>(rx: &mut watch::Receiver<RoomState>, predicate: F) -> RoomState
where
    F: Fn(&RoomState) -> bool,
{
    let result = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let state = rx.borrow();
                if predicate(&state) {
                    return state.clone();
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await;
    result.expect("timed out waiting for state")
}

/// Fetcher for tests that never touch history.
struct UnusedFetcher;

#[async_trait]
impl HistoryFetcher for UnusedFetcher {
    async fn fetch(&self, _limit: u32, _cursor: Option<&str>) -> Result<HistoryPage, HistoryError> {
        Err(HistoryError::Request("no history in this test".into()))
    }
}

/// Fetcher that counts calls and blocks each one on a gate, so a test can
/// hold a fetch in flight.
struct GatedFetcher {
    calls: AtomicU32,
    gate: Notify,
    page: HistoryPage,
}

#[async_trait]
impl HistoryFetcher for GatedFetcher {
    async fn fetch(&self, _limit: u32, _cursor: Option<&str>) -> Result<HistoryPage, HistoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(self.page.clone())
    }
}

#[tokio::test]
async fn reconnects_after_loss_and_state_stays_consistent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        // First connection: snapshot, then abrupt drop.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let join = read_text(&mut ws).await.unwrap();
        assert!(join.contains(r#""type":"join""#));
        send_event(&mut ws, &snapshot(vec![message("m1", 10)])).await;
        drop(ws);

        // Second connection: the handshake replays, the snapshot overlaps
        // the first one, then a live message arrives.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let join = read_text(&mut ws).await.unwrap();
        assert!(join.contains(r#""type":"join""#));
        send_event(&mut ws, &snapshot(vec![message("m1", 10)])).await;
        send_event(&mut ws, &ServerEvent::Message(message("m2", 20))).await;
        while ws.next().await.is_some() {}
    });

    let client = RoomClient::connect_with_fetcher(
        fast_config(format!("ws://{addr}")),
        SessionContext::human("u1", "Ada"),
        Arc::new(UnusedFetcher),
    );
    let mut rx = client.watch();

    let state = wait_for(&mut rx, |s| s.contains_message("m2")).await;
    let ids: Vec<_> = state.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m1", "m2"]);
    assert!(state.connection.connected);
    assert!(state.connection.ever_connected);
    assert_eq!(state.connection.attempt, 0);
}

#[tokio::test]
async fn disconnect_suppresses_redial_until_requested() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let redialed = Arc::new(AtomicBool::new(false));
    let redialed_server = Arc::clone(&redialed);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _join = read_text(&mut ws).await;
        send_event(&mut ws, &snapshot(vec![])).await;
        while read_text(&mut ws).await.is_some() {}

        let (stream, _) = listener.accept().await.unwrap();
        redialed_server.store(true, Ordering::SeqCst);
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _join = read_text(&mut ws).await;
        send_event(&mut ws, &snapshot(vec![])).await;
        while ws.next().await.is_some() {}
    });

    let client = RoomClient::connect_with_fetcher(
        fast_config(format!("ws://{addr}")),
        SessionContext::human("u1", "Ada"),
        Arc::new(UnusedFetcher),
    );
    let mut rx = client.watch();
    wait_for(&mut rx, |s| s.connection.connected).await;

    client.disconnect();
    let state = wait_for(&mut rx, |s| !s.connection.connected).await;
    assert!(!state.connection.reconnecting);

    // Long enough for several backoff periods at this tuning.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!redialed.load(Ordering::SeqCst), "client redialed after an intentional disconnect");

    client.reconnect();
    wait_for(&mut rx, |s| s.connection.connected).await;
    assert!(redialed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn gives_up_after_the_attempt_budget() {
    // Bind then drop, so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig {
        reconnect: ReconnectConfig {
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            max_attempts: 2,
        },
        ..ClientConfig::new(format!("ws://{addr}"), "http://127.0.0.1:1/unused")
    };
    let client = RoomClient::connect_with_fetcher(
        config,
        SessionContext::human("u1", "Ada"),
        Arc::new(UnusedFetcher),
    );
    let mut rx = client.watch();

    // Each failed dial records a transient error; wait for the terminal one.
    let state = wait_for(&mut rx, |s| {
        s.connection.last_error.as_deref().is_some_and(|e| e.contains("gave up"))
    })
    .await;
    let error = state.connection.last_error.unwrap();
    assert!(error.contains("gave up after 2 attempts"), "unexpected error: {error}");
    assert!(!state.connection.connected);
    assert!(!state.connection.reconnecting);
    assert!(!state.connection.ever_connected);
}

#[tokio::test]
async fn overlapping_history_loads_perform_one_fetch() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _join = read_text(&mut ws).await;
        send_event(&mut ws, &snapshot(vec![message("m5", 50)])).await;
        while ws.next().await.is_some() {}
    });

    let fetcher = Arc::new(GatedFetcher {
        calls: AtomicU32::new(0),
        gate: Notify::new(),
        page: HistoryPage {
            messages: vec![message("m3", 30), message("m4", 40)],
            next_cursor: None,
        },
    });
    let client = RoomClient::connect_with_fetcher(
        fast_config(format!("ws://{addr}")),
        SessionContext::human("u1", "Ada"),
        Arc::clone(&fetcher) as Arc<dyn HistoryFetcher>,
    );
    let mut rx = client.watch();
    wait_for(&mut rx, |s| s.contains_message("m5")).await;

    // Two load requests with a fetch already in flight: the guard admits
    // exactly one.
    client.load_history();
    client.load_history();
    wait_for(&mut rx, |s| s.history.loading).await;
    fetcher.gate.notify_one();

    let state = wait_for(&mut rx, |s| s.contains_message("m3")).await;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert!(!state.history.loading);
    assert!(!state.history.has_more);

    let ids: Vec<_> = state.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m3", "m4", "m5"]);
}

#[tokio::test]
async fn failed_history_fetch_clears_the_guard_for_retry() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _join = read_text(&mut ws).await;
        send_event(&mut ws, &snapshot(vec![])).await;
        while ws.next().await.is_some() {}
    });

    /// Fails the first call, serves a page on the second. Gated so the
    /// test can observe the in-flight guard between steps.
    struct FlakyFetcher {
        calls: AtomicU32,
        gate: Notify,
    }

    #[async_trait]
    impl HistoryFetcher for FlakyFetcher {
        async fn fetch(
            &self,
            _limit: u32,
            _cursor: Option<&str>,
        ) -> Result<HistoryPage, HistoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            if call == 0 {
                return Err(HistoryError::Request("503".into()));
            }
            Ok(HistoryPage { messages: vec![message("m1", 10)], next_cursor: None })
        }
    }

    let fetcher = Arc::new(FlakyFetcher { calls: AtomicU32::new(0), gate: Notify::new() });
    let client = RoomClient::connect_with_fetcher(
        fast_config(format!("ws://{addr}")),
        SessionContext::human("u1", "Ada"),
        Arc::clone(&fetcher) as Arc<dyn HistoryFetcher>,
    );
    let mut rx = client.watch();
    wait_for(&mut rx, |s| s.connection.connected).await;

    client.load_history();
    wait_for(&mut rx, |s| s.history.loading).await;
    fetcher.gate.notify_one();
    let state = wait_for(&mut rx, |s| !s.history.loading).await;
    assert!(!state.contains_message("m1"));
    assert!(state.history.has_more);

    // The guard cleared, so a retry goes through with the same cursor.
    client.load_history();
    wait_for(&mut rx, |s| s.history.loading).await;
    fetcher.gate.notify_one();
    let state = wait_for(&mut rx, |s| s.contains_message("m1")).await;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert!(!state.history.has_more);
}
