//! Transport layer for rollcall.
//!
//! Two levels live here:
//!
//! - The raw seam: [`Connector`] opens a [`Connection`], which moves text
//!   frames in both directions. [`WebSocketConnector`] is the production
//!   implementation; the [`memory`] module provides an in-process pair for
//!   tests.
//! - [`SocketTransport`]: one live realtime connection driven by a
//!   background task. It queues requests until the socket opens, stamps
//!   request sequence numbers, keeps the connection alive, parses inbound
//!   frames and reports everything as [`TransportEvent`]s.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket connector via `tokio-tungstenite`
//! - `memory`: in-process connector pair ([`memory`])

mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
mod socket;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use socket::{
    ConnectionState, SocketId, SocketTransport, TransportConfig, TransportEvent,
    TransportEventKind,
};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a raw connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens outbound connections.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Connects to `url`. Resolves once the connection is open.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single open connection carrying text frames.
pub trait Connection: Send + Sync + 'static {
    /// Sends one text frame to the remote peer.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next text frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed. Must be
    /// cancel-safe: a dropped `recv` future loses no frame.
    fn recv(&self) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
