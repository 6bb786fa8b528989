//! The dice roller client.
//!
//! [`DiceRoller`] keeps one realtime socket open to the dice roller, mirrors
//! the table's roll state and roll log from it, and sends commands through
//! a [`CommandEndpoint`].
//!
//! ```text
//!                 ┌──────────── DiceRoller ─────────────┐
//!   commands ───► │ credentials   ──► CommandEndpoint   │ ───► HTTP POST
//!                 │                                     │
//!   socket   ───► │ TransportEvent ─► RollStateMachine  │ ───► state callbacks
//!   events        │                 ─► RollLog          │ ───► roll callbacks
//!                 │ failures       ─► reconnect policy  │ ───► error callbacks
//!                 └─────────────────────────────────────┘
//! ```
//!
//! Socket events are processed when the owner drives the client with
//! [`DiceRoller::run`] (usually on a spawned task) or
//! [`DiceRoller::process_next_event`]. Callbacks run after the client's
//! internal lock is released, so a callback may call back into the client.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rollcall_protocol::{CommandRequest, RequestMessage, SlotPath, SocketResponse};
use rollcall_rolls::{Roll, RollLog, RollState, RollStateMachine, RollType};
use rollcall_session::{AuthToken, Credentials, KeyValueStore, MemoryStore, SlotChange, SlotId};
use rollcall_tick::Backoff;
use rollcall_transport::{
    ConnectionState, Connector, SocketTransport, TransportConfig, TransportEvent,
    TransportEventKind, WebSocketConnector,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::{
    CallbackRegistry, CommandEndpoint, DiceRollerConfig, HttpEndpoint, RollcallError, Subscription,
};

/// Called with the new roll state whenever it visibly changes.
pub type StateCallback = dyn Fn(&RollState) + Send + Sync;
/// Called once for every new roll.
pub type RollCallback = dyn Fn(&Roll) + Send + Sync;
/// Called with `(message, requires_login)` for every published error.
pub type ErrorCallback = dyn Fn(&str, bool) + Send + Sync;

/// Work for the callbacks, collected under the lock and run after it.
enum Notice {
    State(RollState),
    Roll(Roll),
    Error(RollcallError),
}

struct Inner {
    credentials: Credentials,
    socket: Option<SocketTransport>,
    machine: RollStateMachine,
    rolls: RollLog,
    backoff: Backoff,
    connection_id: Option<String>,
    /// Set while the service's settings fail to resolve. Handshakes then
    /// stop resetting the backoff, so a slot stuck in a bad state runs
    /// out of attempts instead of reconnecting forever.
    settings_unresolved: bool,
}

struct Shared<E, C> {
    config: DiceRollerConfig,
    endpoint: E,
    connector: Arc<C>,
    inner: Mutex<Inner>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<TransportEvent>>,
    state_callbacks: CallbackRegistry<StateCallback>,
    roll_callbacks: CallbackRegistry<RollCallback>,
    error_callbacks: CallbackRegistry<ErrorCallback>,
}

// ---------------------------------------------------------------------------
// DiceRoller
// ---------------------------------------------------------------------------

/// Client for one dice roller table. Cheap to clone; clones share
/// everything.
pub struct DiceRoller<E = HttpEndpoint, C = WebSocketConnector> {
    shared: Arc<Shared<E, C>>,
}

impl<E, C> Clone for DiceRoller<E, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl DiceRoller {
    /// Returns a builder for a client talking to the production service.
    pub fn builder() -> DiceRollerBuilder {
        DiceRollerBuilder::new()
    }
}

impl<E: CommandEndpoint, C: Connector> fmt::Debug for DiceRoller<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("DiceRoller")
            .field("slot_id", &inner.credentials.slot_id())
            .field("logged_in", &inner.credentials.is_logged_in())
            .field("state", &inner.machine.state())
            .field("rolls", &inner.rolls.len())
            .field("socket", &inner.socket)
            .finish()
    }
}

impl<E: CommandEndpoint, C: Connector> DiceRoller<E, C> {
    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// The table's current roll state.
    pub fn state(&self) -> RollState {
        self.lock().machine.state()
    }

    /// The rolls of the current roll cycle, oldest first.
    pub fn rolls(&self) -> Vec<Roll> {
        self.lock().rolls.rolls().to_vec()
    }

    pub fn slot_id(&self) -> Option<SlotId> {
        self.lock().credentials.slot_id().cloned()
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().credentials.is_logged_in()
    }

    /// State of the current socket. `Closed` after [`close`](Self::close)
    /// or once reconnection gave up.
    pub fn connection_state(&self) -> ConnectionState {
        self.lock()
            .socket
            .as_ref()
            .map_or(ConnectionState::Closed, SocketTransport::state)
    }

    /// The id the service assigned to the current connection, once its
    /// handshake arrived.
    pub fn connection_id(&self) -> Option<String> {
        self.lock().connection_id.clone()
    }

    pub fn config(&self) -> &DiceRollerConfig {
        &self.shared.config
    }

    pub fn on_state_change(
        &self,
        callback: impl Fn(&RollState) + Send + Sync + 'static,
    ) -> Subscription<StateCallback> {
        self.shared.state_callbacks.subscribe(Arc::new(callback))
    }

    pub fn on_roll(
        &self,
        callback: impl Fn(&Roll) + Send + Sync + 'static,
    ) -> Subscription<RollCallback> {
        self.shared.roll_callbacks.subscribe(Arc::new(callback))
    }

    pub fn on_error(
        &self,
        callback: impl Fn(&str, bool) + Send + Sync + 'static,
    ) -> Subscription<ErrorCallback> {
        self.shared.error_callbacks.subscribe(Arc::new(callback))
    }

    /// The registries behind the `on_*` methods, for callers that manage
    /// [`CallbackHandle`](crate::CallbackHandle)s themselves.
    pub fn state_callbacks(&self) -> &CallbackRegistry<StateCallback> {
        &self.shared.state_callbacks
    }

    pub fn roll_callbacks(&self) -> &CallbackRegistry<RollCallback> {
        &self.shared.roll_callbacks
    }

    pub fn error_callbacks(&self) -> &CallbackRegistry<ErrorCallback> {
        &self.shared.error_callbacks
    }

    // -----------------------------------------------------------------------
    // Slot and archive
    // -----------------------------------------------------------------------

    /// Selects the table to follow.
    ///
    /// The previous slot is unsubscribed and the new one subscribed in one
    /// step. `None` (or an empty string) deselects the slot and resets the
    /// roll state. Anything but exactly six ASCII letters, surrounding
    /// whitespace included, is rejected and the current slot is kept;
    /// nothing is published on the error channel for it.
    pub fn set_slot_id(&self, slot_id: Option<&str>) -> Result<(), RollcallError> {
        let slot_id = match slot_id.filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(
                SlotId::parse(raw)
                    .inspect_err(|e| debug!(error = %e, "ignoring invalid slot id"))?,
            ),
            None => None,
        };

        let notices = {
            let mut inner = self.lock();
            let change = inner.credentials.replace_slot_id(slot_id);
            if let Err(e) = inner.credentials.save_archive() {
                warn!(error = %e, "could not persist slot id");
            }
            info!(previous = ?change.previous, current = ?change.current, "slot id set");
            self.apply_slot_change(&mut inner, &change)
        };
        self.dispatch(notices);
        Ok(())
    }

    /// The durable part of the client state, for saving elsewhere.
    pub fn archive(&self) -> Value {
        self.lock().credentials.archive()
    }

    /// Applies an archive produced by [`archive`](Self::archive).
    /// Anything unrecognisable is ignored.
    pub fn restore_from_archive(&self, archive: &Value) {
        let notices = {
            let mut inner = self.lock();
            let change = inner.credentials.restore_from_archive(archive);
            match change {
                Some(change) => {
                    info!(previous = ?change.previous, current = ?change.current, "slot id restored");
                    self.apply_slot_change(&mut inner, &change)
                }
                None => {
                    debug!("archive carried no slot id");
                    Vec::new()
                }
            }
        };
        self.dispatch(notices);
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Logs in as the table's game master.
    pub async fn login(&self, password: &str) -> Result<(), RollcallError> {
        if self.is_logged_in() {
            return self.fail(RollcallError::AlreadyLoggedIn);
        }

        let request = CommandRequest::Login {
            password: password.to_string(),
        };
        let response = match self.shared.endpoint.execute(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "login request failed");
                return self.fail(e.into());
            }
        };

        if let Some(token) = response.auth_token.and_then(AuthToken::new) {
            let persisted = self.lock().credentials.set_token(Some(token));
            if let Err(e) = persisted {
                warn!(error = %e, "could not persist auth token");
            }
            info!("logged in");
            return Ok(());
        }

        let message = response
            .error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "Login failed".to_string());
        warn!(%message, "login rejected");
        self.fail(RollcallError::LoginRejected(message))
    }

    /// Forgets the auth token.
    pub fn logout(&self) {
        let removed = self.lock().credentials.set_token(None);
        if let Err(e) = removed {
            warn!(error = %e, "could not remove stored auth token");
        }
        info!("logged out");
    }

    /// Opens a roll cycle for `roll_type`.
    pub async fn accept_rolls(&self, roll_type: RollType) -> Result<(), RollcallError> {
        self.send_command(|auth_token, slot_id| CommandRequest::AcceptRolls {
            auth_token,
            slot_id,
            roll: roll_type.wire_roll().to_string(),
            save_roll_type: roll_type.save_roll_type().map(str::to_string),
        })
        .await
    }

    /// Reveals the collected rolls, all at once or one at a time.
    pub async fn reveal_rolls(&self, instantly: bool) -> Result<(), RollcallError> {
        let reveal = if instantly { "instantly" } else { "next" };
        self.send_command(|auth_token, slot_id| CommandRequest::RevealRolls {
            auth_token,
            slot_id,
            reveal: reveal.to_string(),
        })
        .await
    }

    /// Ends the roll cycle. On success the local roll log is cleared too.
    pub async fn reset_rolls(&self) -> Result<(), RollcallError> {
        self.send_command(|auth_token, slot_id| CommandRequest::ResetRolls {
            auth_token,
            slot_id,
        })
        .await?;

        let state = {
            let mut inner = self.lock();
            inner.rolls.clear();
            inner.machine.state()
        };
        self.dispatch(vec![Notice::State(state)]);
        Ok(())
    }

    /// Shows or hides the slot id on the stream overlay.
    pub async fn show_slot_id_in_obs(&self, show: bool) -> Result<(), RollcallError> {
        self.send_command(|auth_token, slot_id| CommandRequest::ShowSlotIdInObs {
            auth_token,
            slot_id,
            show,
        })
        .await
    }

    /// The guarded path shared by every authenticated command. `build`
    /// receives the auth token and the slot id.
    async fn send_command(
        &self,
        build: impl FnOnce(String, String) -> CommandRequest + Send,
    ) -> Result<(), RollcallError> {
        let (slot_id, auth_token) = {
            let inner = self.lock();
            (
                inner.credentials.slot_id().map(|slot| slot.as_str().to_string()),
                inner.credentials.token().map(|token| token.expose().to_string()),
            )
        };
        let Some(slot_id) = slot_id else {
            return self.fail(RollcallError::NoSlotId);
        };
        let Some(auth_token) = auth_token else {
            return self.fail(RollcallError::NotLoggedIn);
        };

        let request = build(auth_token, slot_id);
        let action = request.action();
        match self.shared.endpoint.execute(&request).await {
            Ok(response) => match response.error {
                None => {
                    debug!(action, "command accepted");
                    Ok(())
                }
                Some(detail) => {
                    warn!(action, %detail, "command rejected");
                    self.fail(RollcallError::CommandFailed { detail })
                }
            },
            Err(e) => {
                warn!(action, error = %e, "command failed");
                self.fail(RollcallError::CommandFailed {
                    detail: e.to_string(),
                })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Drops the current socket and opens a fresh one, declaring the SDK
    /// and resubscribing to the selected slot. Also resets the reconnect
    /// backoff.
    pub fn reconnect(&self) {
        let notices = {
            let mut inner = self.lock();
            inner.backoff.reset();
            inner.settings_unresolved = false;
            self.open_socket(&mut inner, Duration::ZERO)
        };
        self.dispatch(notices);
    }

    /// Closes the socket without reconnecting. [`reconnect`](Self::reconnect)
    /// opens a new one.
    pub fn close(&self) {
        let socket = {
            let mut inner = self.lock();
            inner.connection_id = None;
            inner.socket.take()
        };
        if let Some(socket) = socket {
            info!(socket = %socket.id(), "closing dice roller connection");
            socket.close();
        }
    }

    /// Waits for the next socket event and handles it.
    pub async fn process_next_event(&self) {
        let event = self.shared.events_rx.lock().await.recv().await;
        // The client holds a sender itself, so the channel never closes.
        if let Some(event) = event {
            self.handle_event(event);
        }
    }

    /// Handles every socket event that is already waiting. Returns how
    /// many were handled.
    pub fn process_pending_events(&self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.shared.events_rx.try_lock() {
                Ok(mut events) => events.try_recv().ok(),
                Err(_) => None,
            };
            let Some(event) = event else {
                return handled;
            };
            self.handle_event(event);
            handled += 1;
        }
    }

    /// Handles socket events until the task is dropped.
    pub async fn run(&self) {
        loop {
            self.process_next_event().await;
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_event(&self, event: TransportEvent) {
        let notices = {
            let mut inner = self.lock();
            if inner.socket.as_ref().map(SocketTransport::id) != Some(event.socket) {
                trace!(socket = %event.socket, "ignoring event from a retired socket");
                return;
            }

            let mut notices = Vec::new();
            match event.kind {
                TransportEventKind::Opened => {
                    info!(socket = %event.socket, "connected to dice roller");
                }
                TransportEventKind::Message(message) => {
                    self.handle_message(&mut inner, message, &mut notices);
                }
                TransportEventKind::Error {
                    description,
                    notify_user,
                } => {
                    warn!(socket = %event.socket, %description, notify_user, "socket error");
                    if notify_user {
                        notices.push(Notice::Error(RollcallError::Socket(description.clone())));
                    }
                    self.schedule_reconnect(&mut inner, &description, &mut notices);
                }
                TransportEventKind::Closed => {
                    debug!(socket = %event.socket, "socket closed");
                    self.schedule_reconnect(&mut inner, "socket closed", &mut notices);
                }
            }
            notices
        };
        self.dispatch(notices);
    }

    fn handle_message(&self, inner: &mut Inner, message: SocketResponse, notices: &mut Vec<Notice>) {
        trace!(kind = message.kind(), raw = %message.raw(), "socket message");
        match message {
            SocketResponse::Startup { connection_id, .. } => {
                info!(%connection_id, "dice roller handshake");
                if inner.settings_unresolved {
                    debug!("roll state still unresolved; keeping reconnect backoff");
                } else {
                    inner.backoff.reset();
                }
                inner.connection_id = Some(connection_id);
            }
            SocketResponse::Response {
                request_id, status, ..
            } => {
                if status == "ok" {
                    trace!(request_id, "request acknowledged");
                } else {
                    warn!(request_id, %status, "request refused");
                }
            }
            SocketResponse::Settings(change) => match inner.machine.apply(&change) {
                Ok(transition) => {
                    if std::mem::take(&mut inner.settings_unresolved) {
                        inner.backoff.reset();
                    }
                    if transition.changed() {
                        notices.push(Notice::State(transition.current));
                    }
                }
                Err(e) => {
                    // Reported once per run of failures.
                    if !inner.settings_unresolved {
                        notices.push(Notice::Error(RollcallError::UnexpectedState(e)));
                    }
                    inner.settings_unresolved = true;
                    self.schedule_reconnect(inner, "unexpected roll state", notices);
                }
            },
            SocketResponse::Roll(change) => {
                if change.clear {
                    inner.rolls.clear();
                    debug!("roll log cleared");
                    notices.push(Notice::State(inner.machine.state()));
                }
                let Some(slot_id) = inner.credentials.slot_id() else {
                    debug!("ignoring rolls with no slot selected");
                    return;
                };
                for group in &change.rolls {
                    notices.extend(
                        inner
                            .rolls
                            .ingest(group, slot_id.as_str())
                            .into_iter()
                            .map(Notice::Roll),
                    );
                }
            }
            SocketResponse::Unknown { .. } => {}
        }
    }

    /// Unsubscribes the previous slot and subscribes the current one on
    /// the live socket.
    fn apply_slot_change(&self, inner: &mut Inner, change: &SlotChange) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Some(socket) = &inner.socket {
            if let Some(previous) = &change.previous {
                for path in SlotPath::ALL {
                    socket.send(RequestMessage::listen(false, path, previous.as_str()));
                }
            }
            if let Some(current) = &change.current {
                for path in SlotPath::ALL {
                    socket.send(RequestMessage::listen(true, path, current.as_str()));
                }
            }
        }

        // A fresh subscription replays the slot's whole roll list.
        if inner.rolls.clear() {
            notices.push(Notice::State(inner.machine.state()));
        }

        if change.current.is_none() {
            match inner.machine.resync() {
                Ok(transition) => {
                    if transition.changed() {
                        notices.push(Notice::State(transition.current));
                    }
                }
                Err(e) => notices.push(Notice::Error(RollcallError::UnexpectedState(e))),
            }
        }
        notices
    }

    /// Replaces the socket, after `start_delay`, with one that declares
    /// the SDK and listens to the selected slot.
    fn open_socket(&self, inner: &mut Inner, start_delay: Duration) -> Vec<Notice> {
        if let Some(old) = inner.socket.take() {
            old.close();
        }
        inner.connection_id = None;

        let config = &self.shared.config;
        let socket = SocketTransport::open(
            Arc::clone(&self.shared.connector),
            config.socket_url.clone(),
            TransportConfig {
                keepalive: config.keepalive,
                start_delay,
            },
            self.shared.events_tx.clone(),
        );
        socket.send(RequestMessage::sdk(&config.sdk));

        let mut notices = Vec::new();
        if let Some(slot_id) = inner.credentials.slot_id() {
            for path in SlotPath::ALL {
                socket.send(RequestMessage::listen(true, path, slot_id.as_str()));
            }
        }
        if inner.rolls.clear() {
            notices.push(Notice::State(inner.machine.state()));
        }
        inner.socket = Some(socket);
        notices
    }

    fn schedule_reconnect(&self, inner: &mut Inner, reason: &str, notices: &mut Vec<Notice>) {
        match inner.backoff.next_delay() {
            Some(delay) => {
                info!(
                    %reason,
                    attempt = inner.backoff.attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "reconnecting to dice roller"
                );
                notices.extend(self.open_socket(inner, delay));
            }
            None => {
                error!(%reason, attempts = inner.backoff.attempts(), "giving up on the dice roller");
                if let Some(socket) = inner.socket.take() {
                    socket.close();
                }
                inner.connection_id = None;
                notices.push(Notice::Error(RollcallError::ConnectionLost));
            }
        }
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::State(state) => self.shared.state_callbacks.trigger(|cb| cb(&state)),
                Notice::Roll(roll) => self.shared.roll_callbacks.trigger(|cb| cb(&roll)),
                Notice::Error(error) => self.publish_error(&error),
            }
        }
    }

    fn publish_error(&self, error: &RollcallError) {
        let message = error.user_message();
        let requires_login = error.requires_login();
        debug!(%message, requires_login, "publishing error");
        self.shared
            .error_callbacks
            .trigger(|cb| cb(&message, requires_login));
    }

    fn fail(&self, error: RollcallError) -> Result<(), RollcallError> {
        self.publish_error(&error);
        Err(error)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`DiceRoller`].
///
/// Without further setup it talks to the production service over
/// WebSocket and HTTPS and keeps credentials in memory only.
pub struct DiceRollerBuilder<E = HttpEndpoint, C = WebSocketConnector> {
    config: DiceRollerConfig,
    endpoint: Option<E>,
    connector: C,
    session_store: Option<Arc<dyn KeyValueStore>>,
    durable_store: Option<Arc<dyn KeyValueStore>>,
}

impl DiceRollerBuilder {
    pub fn new() -> Self {
        Self {
            config: DiceRollerConfig::default(),
            endpoint: None,
            connector: WebSocketConnector,
            session_store: None,
            durable_store: None,
        }
    }
}

impl Default for DiceRollerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandEndpoint, C: Connector> DiceRollerBuilder<E, C> {
    pub fn config(mut self, config: DiceRollerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sends commands through `endpoint` instead of one built from the
    /// configured URL.
    pub fn endpoint<E2: CommandEndpoint>(self, endpoint: E2) -> DiceRollerBuilder<E2, C> {
        DiceRollerBuilder {
            config: self.config,
            endpoint: Some(endpoint),
            connector: self.connector,
            session_store: self.session_store,
            durable_store: self.durable_store,
        }
    }

    /// Opens sockets through `connector`.
    pub fn connector<C2: Connector>(self, connector: C2) -> DiceRollerBuilder<E, C2> {
        DiceRollerBuilder {
            config: self.config,
            endpoint: self.endpoint,
            connector,
            session_store: self.session_store,
            durable_store: self.durable_store,
        }
    }

    /// Where the auth token lives. Defaults to memory.
    pub fn session_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Where the slot id survives restarts. Defaults to memory.
    pub fn durable_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.durable_store = Some(store);
        self
    }

    /// Restores the credentials and starts connecting.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns `RollcallError::Config` if no endpoint was given and `E`
    /// cannot be built from the configuration.
    pub fn build(self) -> Result<DiceRoller<E, C>, RollcallError> {
        let endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => E::from_config(&self.config).ok_or_else(|| {
                RollcallError::Config("no command endpoint configured".to_string())
            })?,
        };
        let session: Arc<dyn KeyValueStore> = match self.session_store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new()),
        };
        let durable: Arc<dyn KeyValueStore> = match self.durable_store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new()),
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let backoff = Backoff::new(self.config.reconnect.clone());
        let roller = DiceRoller {
            shared: Arc::new(Shared {
                config: self.config,
                endpoint,
                connector: Arc::new(self.connector),
                inner: Mutex::new(Inner {
                    credentials: Credentials::load(session, durable),
                    socket: None,
                    machine: RollStateMachine::new(),
                    rolls: RollLog::new(),
                    backoff,
                    connection_id: None,
                    settings_unresolved: false,
                }),
                events_tx,
                events_rx: tokio::sync::Mutex::new(events_rx),
                state_callbacks: CallbackRegistry::new(),
                roll_callbacks: CallbackRegistry::new(),
                error_callbacks: CallbackRegistry::new(),
            }),
        };

        info!(
            socket_url = %roller.shared.config.socket_url,
            slot_id = ?roller.slot_id(),
            logged_in = roller.is_logged_in(),
            "dice roller client starting"
        );
        roller.reconnect();
        Ok(roller)
    }
}
