/// Failures raised by a socket connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket could not be opened.
    #[error("connect to {url} failed: {reason}")]
    ConnectFailed { url: String, reason: String },
    /// The remote end went away.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),
    /// A frame could not be read off the socket.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
