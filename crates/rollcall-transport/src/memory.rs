//! In-process connector pair.
//!
//! [`channel`] returns a [`MemoryConnector`] for the client side and a
//! [`MemoryAcceptor`] for the test's side. Every `connect` call shows up at
//! the acceptor as a [`PendingPeer`], which the test can accept (getting a
//! [`MemoryPeer`] to script the server with) or refuse.
//!
//! ```ignore
//! let (connector, mut acceptor) = memory::channel();
//! let transport = SocketTransport::open(Arc::new(connector), url, config, events_tx);
//! let mut server = acceptor.next().await.unwrap().accept();
//! assert_eq!(server.recv().await.as_deref(), Some(r#"{"t":"d",...}"#));
//! server.send_text(r#"{"t":"c","d":{"t":"h","d":{"s":"conn-1"}}}"#);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::{Connection, ConnectionId, Connector, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Frames travelling server → client. `Err` injects a raw-layer failure.
type Downstream = Result<String, String>;

/// Creates a connected connector/acceptor pair.
pub fn channel() -> (MemoryConnector, MemoryAcceptor) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemoryConnector { pending: tx }, MemoryAcceptor { pending: rx })
}

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

/// Client half of [`channel`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    pending: mpsc::UnboundedSender<PendingPeer>,
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    async fn connect(&self, url: &str) -> Result<Self::Connection, TransportError> {
        let (reply, answer) = oneshot::channel();
        let refused = |reason: &str| TransportError::ConnectFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        self.pending
            .send(PendingPeer {
                url: url.to_string(),
                reply,
            })
            .map_err(|_| refused("acceptor dropped"))?;

        match answer.await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(reason)) => Err(refused(&reason)),
            Err(_) => Err(refused("connection attempt dropped")),
        }
    }
}

/// Client end of an in-memory connection.
#[derive(Debug)]
pub struct MemoryConnection {
    id: ConnectionId,
    upstream: Mutex<Option<mpsc::UnboundedSender<String>>>,
    downstream: tokio::sync::Mutex<mpsc::UnboundedReceiver<Downstream>>,
}

impl Connection for MemoryConnection {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        let upstream = self.upstream.lock().unwrap_or_else(PoisonError::into_inner);
        let sent = upstream
            .as_ref()
            .map(|tx| tx.send(text.to_string()).is_ok())
            .unwrap_or(false);
        if sent {
            Ok(())
        } else {
            Err(TransportError::ConnectionClosed("peer gone".into()))
        }
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        match self.downstream.lock().await.recv().await {
            Some(Ok(text)) => Ok(Some(text)),
            Some(Err(reason)) => Err(TransportError::ReceiveFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                reason,
            ))),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.upstream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

// ---------------------------------------------------------------------------
// Server side
// ---------------------------------------------------------------------------

/// Server half of [`channel`]: yields one [`PendingPeer`] per connect call.
#[derive(Debug)]
pub struct MemoryAcceptor {
    pending: mpsc::UnboundedReceiver<PendingPeer>,
}

impl MemoryAcceptor {
    /// Waits for the next connection attempt. `None` once every connector
    /// clone is dropped.
    pub async fn next(&mut self) -> Option<PendingPeer> {
        self.pending.recv().await
    }

    /// Returns a connection attempt if one is already waiting.
    pub fn try_next(&mut self) -> Option<PendingPeer> {
        self.pending.try_recv().ok()
    }
}

/// A connection attempt awaiting a decision.
#[derive(Debug)]
pub struct PendingPeer {
    url: String,
    reply: oneshot::Sender<Result<MemoryConnection, String>>,
}

impl PendingPeer {
    /// The URL the client asked for.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Completes the connection and returns the server end.
    pub fn accept(self) -> MemoryPeer {
        let (up_tx, up_rx) = mpsc::unbounded_channel();
        let (down_tx, down_rx) = mpsc::unbounded_channel();
        let connection = MemoryConnection {
            id: ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)),
            upstream: Mutex::new(Some(up_tx)),
            downstream: tokio::sync::Mutex::new(down_rx),
        };
        // If the client gave up, the peer simply reads as closed.
        let _ = self.reply.send(Ok(connection));
        MemoryPeer {
            outbound: down_tx,
            inbound: up_rx,
        }
    }

    /// Fails the connection attempt with `reason`.
    pub fn refuse(self, reason: impl Into<String>) {
        let _ = self.reply.send(Err(reason.into()));
    }
}

/// Server end of an in-memory connection. Dropping it closes the
/// connection from the server side.
#[derive(Debug)]
pub struct MemoryPeer {
    outbound: mpsc::UnboundedSender<Downstream>,
    inbound: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Sends a raw text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.outbound.send(Ok(text.into())).is_ok()
    }

    /// Makes the client's next `recv` fail with a raw-layer error.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.outbound.send(Err(reason.into())).is_ok()
    }

    /// Receives the next frame the client sent. `None` once the client
    /// closed its end.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Returns the next client frame if one is already waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.inbound.try_recv().ok()
    }
}
