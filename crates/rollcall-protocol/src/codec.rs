//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The realtime service speaks JSON over WebSocket *text* frames, so the
//! codec works with `String`/`&str` rather than raw bytes. Keeping the
//! conversion behind a trait means the transport doesn't care how frames
//! are produced, and tests can swap in a codec that fails on purpose.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to text frames and decode them back.
///
/// `Send + Sync + 'static` because the codec lives inside the transport's
/// background task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or doesn't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use rollcall_protocol::{Codec, JsonCodec, RequestMessage};
///
/// let codec = JsonCodec;
/// let frame = codec.encode(&RequestMessage::sdk("sdk.js.9-4-1").with_request_id(1).to_frame())
///     .unwrap();
/// assert_eq!(frame, r#"{"t":"d","d":{"a":"s","b":{"c":{"sdk.js.9-4-1":1}},"r":1}}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_json_codec_decode_malformed_returns_decode_error() {
        let result: Result<Value, _> = JsonCodec.decode("{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encode_produces_compact_text() {
        let text = JsonCodec.encode(&json!({ "a": 1 })).unwrap();
        assert_eq!(text, r#"{"a":1}"#);
    }
}
