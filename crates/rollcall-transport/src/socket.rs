//! One realtime connection, driven by a background task.
//!
//! A [`SocketTransport`] is a handle. [`SocketTransport::open`] spawns a
//! task that owns the raw [`Connection`] for its whole life:
//!
//! ```text
//!   open() ──► Connecting ──► Open ──► Closed
//!                 │  queue      │ flush queue, stamp ids,
//!                 │  sends      │ keepalive, parse frames
//!                 └─────────────┴──► Error{..} ──► Closed
//! ```
//!
//! The transport never reconnects by itself. Any raw-layer failure ends
//! the connection with an [`TransportEventKind::Error`] followed by
//! [`TransportEventKind::Closed`]; whoever owns the transport decides
//! whether to open a new one. Every event carries the [`SocketId`] of the
//! transport that produced it, so an owner that has already moved on can
//! ignore stragglers from an old connection.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rollcall_protocol::{
    Codec, JsonCodec, KEEPALIVE_FRAME, RequestMessage, SocketResponse, decode_frame,
};
use rollcall_tick::Keepalive;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::{Connection, Connector};

static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one [`SocketTransport`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    fn next() -> Self {
        Self(NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket-{}", self.0)
    }
}

/// Lifecycle of a transport's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Something that happened on a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEvent {
    pub socket: SocketId,
    pub kind: TransportEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEventKind {
    /// The connection is open and the send queue has been flushed.
    Opened,
    /// A classified inbound frame.
    Message(SocketResponse),
    /// The connection failed and is being torn down. `notify_user` marks
    /// failures of something we tried to send, as opposed to background
    /// trouble such as a dropped link or an unreadable frame.
    Error {
        description: String,
        notify_user: bool,
    },
    /// The connection is gone. Always the last event of a transport.
    Closed,
}

/// Tuning for a [`SocketTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Idle time after the last send before a keepalive frame goes out.
    pub keepalive: Duration,
    /// Wait this long before connecting. Sends are still queued meanwhile.
    pub start_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            keepalive: Duration::from_secs(45),
            start_delay: Duration::ZERO,
        }
    }
}

enum Command {
    Send(RequestMessage),
    Close,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to one realtime connection.
///
/// Dropping the handle closes the connection.
pub struct SocketTransport {
    id: SocketId,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketTransport")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

impl SocketTransport {
    /// Starts connecting to `url` in the background and returns at once.
    ///
    /// Events are delivered on `events`. Must be called from within a
    /// Tokio runtime.
    pub fn open<C: Connector>(
        connector: Arc<C>,
        url: impl Into<String>,
        config: TransportConfig,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let id = SocketId::next();
        let url = url.into();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);

        debug!(socket = %id, %url, "opening socket");
        let sink = EventSink {
            socket: id,
            events,
            state: state_tx,
        };
        tokio::spawn(run(connector, url, config, command_rx, sink));

        Self {
            id,
            commands,
            state,
        }
    }

    /// Queues `message` for sending. Messages go out in call order; each
    /// gets its request id when it actually leaves.
    ///
    /// Sending on a closed transport is a no-op.
    pub fn send(&self, message: RequestMessage) {
        if self.commands.send(Command::Send(message)).is_err() {
            debug!(socket = %self.id, "send on closed socket dropped");
        }
    }

    /// Closes the connection. Queued messages that have not left yet are
    /// discarded.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn id(&self) -> SocketId {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

struct EventSink {
    socket: SocketId,
    events: mpsc::UnboundedSender<TransportEvent>,
    state: watch::Sender<ConnectionState>,
}

impl EventSink {
    fn emit(&self, kind: TransportEventKind) {
        // The owner may have moved on; nobody listening is fine.
        let _ = self.events.send(TransportEvent {
            socket: self.socket,
            kind,
        });
    }

    fn closed(&self, failure: Option<Failure>) {
        if let Some(failure) = failure {
            warn!(
                socket = %self.socket,
                error = %failure.description,
                notify_user = failure.notify_user,
                "socket error"
            );
            self.emit(TransportEventKind::Error {
                description: failure.description,
                notify_user: failure.notify_user,
            });
        }
        self.state.send_replace(ConnectionState::Closed);
        debug!(socket = %self.socket, "socket closed");
        self.emit(TransportEventKind::Closed);
    }
}

struct Failure {
    description: String,
    notify_user: bool,
}

impl Failure {
    fn new(description: impl Into<String>, notify_user: bool) -> Self {
        Self {
            description: description.into(),
            notify_user,
        }
    }
}

/// What to do with commands that arrive before the connection is open.
enum Pending {
    Queued,
    Close,
}

fn queue(command: Option<Command>, pending: &mut VecDeque<RequestMessage>) -> Pending {
    match command {
        Some(Command::Send(message)) => {
            pending.push_back(message);
            Pending::Queued
        }
        Some(Command::Close) | None => Pending::Close,
    }
}

async fn run<C: Connector>(
    connector: Arc<C>,
    url: String,
    config: TransportConfig,
    mut commands: mpsc::UnboundedReceiver<Command>,
    sink: EventSink,
) {
    let mut pending = VecDeque::new();

    if !config.start_delay.is_zero() {
        let delay = time::sleep(config.start_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                () = &mut delay => break,
                command = commands.recv() => {
                    if let Pending::Close = queue(command, &mut pending) {
                        sink.closed(None);
                        return;
                    }
                }
            }
        }
    }

    let connect = connector.connect(&url);
    tokio::pin!(connect);
    let connected = loop {
        tokio::select! {
            result = &mut connect => break result,
            command = commands.recv() => {
                if let Pending::Close = queue(command, &mut pending) {
                    sink.closed(None);
                    return;
                }
            }
        }
    };

    let conn = match connected {
        Ok(conn) => conn,
        Err(e) => {
            sink.closed(Some(Failure::new(e.to_string(), false)));
            return;
        }
    };

    info!(socket = %sink.socket, conn = %conn.id(), "socket open");
    sink.state.send_replace(ConnectionState::Open);

    let mut session = Session {
        conn,
        codec: JsonCodec,
        next_request_id: 1,
        keepalive: Keepalive::new(config.keepalive),
        socket: sink.socket,
    };

    let outcome = session.drive(pending, &mut commands, &sink).await;
    if let Err(e) = session.conn.close().await {
        trace!(socket = %sink.socket, error = %e, "close after shutdown failed");
    }
    sink.closed(outcome.err());
}

/// State of an open connection.
struct Session<T> {
    conn: T,
    codec: JsonCodec,
    next_request_id: u64,
    keepalive: Keepalive,
    socket: SocketId,
}

impl<T: Connection> Session<T> {
    async fn drive(
        &mut self,
        pending: VecDeque<RequestMessage>,
        commands: &mut mpsc::UnboundedReceiver<Command>,
        sink: &EventSink,
    ) -> Result<(), Failure> {
        for message in pending {
            self.send(message).await?;
        }
        sink.emit(TransportEventKind::Opened);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send(message)) => self.send(message).await?,
                    Some(Command::Close) | None => return Ok(()),
                },
                received = self.conn.recv() => match received {
                    Ok(Some(text)) => {
                        trace!(socket = %self.socket, frame = %text, "received");
                        let message = decode_frame(&self.codec, &text)
                            .map_err(|e| Failure::new(e.to_string(), false))?;
                        sink.emit(TransportEventKind::Message(message));
                    }
                    Ok(None) => return Err(Failure::new("socket closed by server", false)),
                    Err(e) => return Err(Failure::new(e.to_string(), false)),
                },
                () = self.keepalive.wait() => {
                    trace!(socket = %self.socket, "sending keepalive");
                    self.conn
                        .send(KEEPALIVE_FRAME)
                        .await
                        .map_err(|e| Failure::new(e.to_string(), false))?;
                }
            }
        }
    }

    async fn send(&mut self, message: RequestMessage) -> Result<(), Failure> {
        let message = message.with_request_id(self.next_request_id);
        self.next_request_id += 1;

        let text = self
            .codec
            .encode(&message.to_frame())
            .map_err(|e| Failure::new(e.to_string(), true))?;
        trace!(socket = %self.socket, frame = %text, "sending");
        self.conn
            .send(&text)
            .await
            .map_err(|e| Failure::new(e.to_string(), true))?;
        self.keepalive.reset();
        Ok(())
    }
}
