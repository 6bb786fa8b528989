//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes were wrong, never the network.
//! Frames that are well-formed JSON but carry a shape we don't know are not
//! errors at all: they classify as [`SocketResponse::Unknown`](crate::SocketResponse::Unknown).

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into a text frame).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: the inbound frame was not valid JSON, or a
    /// body didn't match the expected type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
