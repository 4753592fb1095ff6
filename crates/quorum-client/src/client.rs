//! Room client runtime.
//!
//! [`RoomClient`] spawns a single driver task that owns the [`RoomState`]
//! and the reconnection supervisor. Inbound events, caller commands, and
//! history results all flow through one control channel, so every state
//! transition is totally ordered and no lock guards the state. After each
//! transition the driver publishes a snapshot over a watch channel for the
//! UI to render.
//!
//! Recovery after a reconnect does not resume a cursor: the server re-sends
//! a full state snapshot right after the replayed join handshake, and the
//! reducer treats it as authoritative.

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use quorum_core::{RoomState, Supervisor, SupervisorAction};
use quorum_proto::{AgentConfig, AgentPatch, ClientCommand, HistoryPage};
use tokio::sync::{mpsc, watch};

use crate::{
    config::ClientConfig,
    history::{HistoryError, HistoryFetcher, RestHistoryFetcher},
    session::SessionContext,
    transport::{self, Connection},
};

/// Control messages into the driver task.
enum Control {
    /// Forward one command through the guarded send.
    Command(ClientCommand),
    /// Start a history fetch, subject to the in-flight guard.
    LoadHistory,
    /// A history fetch completed.
    HistoryResult(Result<HistoryPage, HistoryError>),
    /// Explicit reconnect request, e.g. after exhaustion.
    Reconnect,
    /// Intentional disconnect; suppresses auto-reconnect.
    Disconnect,
}

/// Handle to a running room client.
///
/// Cheap to use from any task: methods post to the driver's control
/// channel. Dropping the handle shuts the driver down.
pub struct RoomClient {
    ctrl: mpsc::UnboundedSender<Control>,
    state: watch::Receiver<RoomState>,
}

impl RoomClient {
    /// Start a client for the given endpoints and identity.
    ///
    /// Dialing begins immediately; progress and failures surface through
    /// the state snapshots rather than a fallible constructor, since a
    /// failed first dial is handled by the same backoff as any later loss.
    pub fn connect(config: ClientConfig, session: SessionContext) -> Self {
        let fetcher = Arc::new(RestHistoryFetcher::new(config.history_url.clone()));
        Self::connect_with_fetcher(config, session, fetcher)
    }

    /// Start a client with a custom history fetcher (used by tests).
    pub fn connect_with_fetcher(
        config: ClientConfig,
        session: SessionContext,
        fetcher: Arc<dyn HistoryFetcher>,
    ) -> Self {
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(RoomState::new());

        let driver = Driver {
            supervisor: Supervisor::new(config.reconnect.clone()),
            config,
            session,
            fetcher,
            state: RoomState::new(),
            state_tx,
            // Weak so the driver's own sender does not keep the channel
            // open after the handle is dropped.
            ctrl_tx: ctrl_tx.downgrade(),
            ctrl_rx,
        };
        tokio::spawn(driver.run());

        Self { ctrl: ctrl_tx, state: state_rx }
    }

    /// Watch channel of state snapshots, one per transition.
    pub fn watch(&self) -> watch::Receiver<RoomState> {
        self.state.clone()
    }

    /// The most recent state snapshot.
    pub fn current(&self) -> RoomState {
        self.state.borrow().clone()
    }

    /// Post a message, optionally mentioning participants or replying.
    pub fn send_message(
        &self,
        content: impl Into<String>,
        mentions: Vec<String>,
        reply_to: Option<String>,
    ) {
        self.command(ClientCommand::Message { content: content.into(), mentions, reply_to });
    }

    /// Signal typing activity on or off.
    pub fn set_typing(&self, is_typing: bool) {
        self.command(ClientCommand::Typing { is_typing });
    }

    /// Ask the server to cut off an in-flight agent response.
    pub fn interrupt(&self, llm_id: impl Into<String>, message_id: Option<String>) {
        self.command(ClientCommand::Interrupt { llm_id: llm_id.into(), message_id });
    }

    /// Attach a new agent to the room.
    pub fn add_agent(&self, llm: AgentConfig) {
        self.command(ClientCommand::AddLlm { llm });
    }

    /// Change an existing agent's configuration.
    pub fn update_agent(&self, llm_id: impl Into<String>, patch: AgentPatch) {
        self.command(ClientCommand::UpdateLlm { llm_id: llm_id.into(), patch });
    }

    /// Detach an agent from the room.
    pub fn remove_agent(&self, llm_id: impl Into<String>) {
        self.command(ClientCommand::RemoveLlm { llm_id: llm_id.into() });
    }

    /// Open a poll.
    pub fn create_poll(
        &self,
        question: impl Into<String>,
        options: Vec<String>,
        allow_multiple: bool,
        anonymous: bool,
        mandatory: bool,
    ) {
        self.command(ClientCommand::CreatePoll {
            question: question.into(),
            options,
            allow_multiple,
            anonymous,
            mandatory,
        });
    }

    /// Cast a ballot.
    pub fn cast_vote(
        &self,
        poll_id: impl Into<String>,
        option_ids: Vec<String>,
        reason: Option<String>,
    ) {
        self.command(ClientCommand::CastVote { poll_id: poll_id.into(), option_ids, reason });
    }

    /// Stop a poll from accepting votes.
    pub fn close_poll(&self, poll_id: impl Into<String>) {
        self.command(ClientCommand::ClosePoll { poll_id: poll_id.into() });
    }

    /// Change the room description.
    pub fn update_room_description(&self, description: impl Into<String>) {
        self.command(ClientCommand::UpdateRoomDescription { description: description.into() });
    }

    /// Fetch one older page of history. No-op while a fetch is in flight
    /// or when no older history remains.
    pub fn load_history(&self) {
        let _ = self.ctrl.send(Control::LoadHistory);
    }

    /// Disconnect intentionally: cancels any pending retry and suppresses
    /// auto-reconnect. Idempotent.
    pub fn disconnect(&self) {
        let _ = self.ctrl.send(Control::Disconnect);
    }

    /// Dial again after an intentional disconnect or after the retry
    /// budget was exhausted.
    pub fn reconnect(&self) {
        let _ = self.ctrl.send(Control::Reconnect);
    }

    fn command(&self, command: ClientCommand) {
        // A closed channel means the driver is gone; the command is
        // dropped exactly as it would be on a closed connection.
        let _ = self.ctrl.send(Control::Command(command));
    }
}

/// Why the driver stopped serving a connection.
enum CloseReason {
    /// Socket closed or errored without an explicit disconnect.
    Unintentional,
    /// The caller asked for it.
    Intentional,
    /// The control channel closed; the client handle was dropped.
    HandleDropped,
}

/// Outcome of a backoff sleep.
enum SleepOutcome {
    /// Delay elapsed; dial again.
    Completed,
    /// Disconnect arrived mid-sleep; the retry is cancelled.
    Cancelled,
    /// The client handle was dropped.
    HandleDropped,
}

/// The driver task: owns the state and the one live connection.
struct Driver {
    config: ClientConfig,
    session: SessionContext,
    fetcher: Arc<dyn HistoryFetcher>,
    supervisor: Supervisor,
    state: RoomState,
    state_tx: watch::Sender<RoomState>,
    ctrl_tx: mpsc::WeakUnboundedSender<Control>,
    ctrl_rx: mpsc::UnboundedReceiver<Control>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            let join = self.session.join_command();
            match transport::connect(&self.config.ws_url, &join).await {
                Ok(mut conn) => {
                    self.supervisor.on_open();
                    self.state.connection.opened();
                    self.publish();
                    tracing::info!(url = %self.config.ws_url, "connected");

                    let reason = self.serve(&mut conn).await;
                    conn.shutdown();

                    match reason {
                        CloseReason::Unintentional => {
                            if !self.after_close(false).await {
                                return;
                            }
                        },
                        CloseReason::Intentional => {
                            if !self.after_close(true).await {
                                return;
                            }
                        },
                        CloseReason::HandleDropped => return,
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, "dial failed");
                    self.state.connection.last_error = Some(error.to_string());
                    if !self.after_close(false).await {
                        return;
                    }
                },
            }
        }
    }

    /// Serve one live connection until it closes.
    async fn serve(&mut self, conn: &mut Connection) -> CloseReason {
        loop {
            tokio::select! {
                event = conn.recv() => match event {
                    Some(event) => {
                        self.state.apply(event, now_ms());
                        self.publish();
                    },
                    None => {
                        tracing::warn!("connection lost");
                        return CloseReason::Unintentional;
                    },
                },
                ctrl = self.ctrl_rx.recv() => match ctrl {
                    None => return CloseReason::HandleDropped,
                    Some(Control::Disconnect) => return CloseReason::Intentional,
                    Some(Control::Command(command)) => conn.send(&command),
                    Some(Control::LoadHistory) => self.start_history_fetch(),
                    Some(Control::HistoryResult(result)) => self.finish_history_fetch(result),
                    Some(Control::Reconnect) => {},
                },
            }
        }
    }

    /// Consult the supervisor after a closure. Returns `false` when the
    /// driver should stop entirely.
    async fn after_close(&mut self, intentional: bool) -> bool {
        match self.supervisor.on_close(intentional) {
            SupervisorAction::Retry { attempt, delay } => {
                self.state.connection.lost(attempt);
                self.publish();
                tracing::info!(attempt, ?delay, "retry scheduled");
                match self.backoff_sleep(delay).await {
                    SleepOutcome::Completed => true,
                    SleepOutcome::Cancelled => self.idle().await,
                    SleepOutcome::HandleDropped => false,
                }
            },
            SupervisorAction::GiveUp => {
                let attempts = self.supervisor.max_attempts();
                tracing::error!(attempts, "reconnect budget exhausted");
                self.state
                    .connection
                    .exhausted(format!("connection lost; gave up after {attempts} attempts"));
                self.publish();
                self.idle().await
            },
            SupervisorAction::Stop => {
                self.state.connection.closed();
                self.publish();
                self.idle().await
            },
        }
    }

    /// Sleep out a backoff delay, still answering control traffic.
    async fn backoff_sleep(&mut self, delay: Duration) -> SleepOutcome {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return SleepOutcome::Completed,
                ctrl = self.ctrl_rx.recv() => match ctrl {
                    None => return SleepOutcome::HandleDropped,
                    Some(Control::Disconnect) => {
                        self.supervisor.on_disconnect();
                        self.state.connection.closed();
                        self.publish();
                        return SleepOutcome::Cancelled;
                    },
                    // Skip the rest of the delay on an explicit request.
                    Some(Control::Reconnect) => return SleepOutcome::Completed,
                    Some(Control::Command(_)) => {
                        tracing::debug!("dropping command while disconnected");
                    },
                    Some(Control::LoadHistory) => self.start_history_fetch(),
                    Some(Control::HistoryResult(result)) => self.finish_history_fetch(result),
                },
            }
        }
    }

    /// Wait, disconnected, until the caller asks to reconnect. Returns
    /// `false` when the driver should stop entirely.
    async fn idle(&mut self) -> bool {
        loop {
            match self.ctrl_rx.recv().await {
                None => return false,
                Some(Control::Reconnect) => {
                    self.supervisor.on_reconnect_requested();
                    self.state.connection.last_error = None;
                    self.publish();
                    return true;
                },
                Some(Control::Disconnect) => {},
                Some(Control::Command(_)) => {
                    tracing::debug!("dropping command while disconnected");
                },
                // History is a REST collaborator; it works while the
                // stream is down.
                Some(Control::LoadHistory) => self.start_history_fetch(),
                Some(Control::HistoryResult(result)) => self.finish_history_fetch(result),
            }
        }
    }

    /// Kick off a history fetch unless one is in flight or the log is
    /// complete. The result comes back through the control channel so the
    /// merge happens in event order.
    fn start_history_fetch(&mut self) {
        if !self.state.begin_history_fetch() {
            tracing::debug!("history fetch suppressed by guard");
            return;
        }
        self.publish();

        let fetcher = Arc::clone(&self.fetcher);
        let limit = self.config.page_size;
        let cursor = self.state.history.cursor.clone();
        let ctrl = self.ctrl_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(limit, cursor.as_deref()).await;
            if let Some(ctrl) = ctrl.upgrade() {
                let _ = ctrl.send(Control::HistoryResult(result));
            }
        });
    }

    fn finish_history_fetch(&mut self, result: Result<HistoryPage, HistoryError>) {
        match result {
            Ok(page) => self.state.merge_history(page),
            Err(error) => {
                tracing::warn!(%error, "history fetch failed");
                self.state.history_fetch_failed();
            },
        }
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

/// Milliseconds since the Unix epoch, for stamping locally finalized
/// messages.
fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as i64)
}
