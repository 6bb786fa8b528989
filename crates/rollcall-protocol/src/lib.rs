//! Wire protocol for rollcall.
//!
//! This crate defines everything that travels between the dice roller
//! client and the outside world:
//!
//! - **Requests** ([`RequestMessage`]) - the outbound realtime frames
//!   (SDK declaration, listen, unlisten) and the keepalive frame.
//! - **Responses** ([`SocketResponse`], [`parse_response`]) - the closed set
//!   of inbound message kinds the realtime service pushes to us.
//! - **Commands** ([`CommandRequest`], [`CommandResponse`]) - the JSON
//!   bodies exchanged with the HTTP command endpoint.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) - how frames become text.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer is pure: it never touches a socket. The transport
//! hands it raw text frames and gets typed messages back.
//!
//! ```text
//! Transport (text frames) → Protocol (SocketResponse) → Rolls (RollState, Roll)
//! ```

mod codec;
mod command;
mod error;
mod request;
mod response;

pub use codec::{Codec, JsonCodec};
pub use command::{CommandRequest, CommandResponse};
pub use error::ProtocolError;
pub use request::{
    KEEPALIVE_FRAME, OutboundFrame, RequestMessage, RequestPayload, RequestVerb, SlotPath,
};
pub use response::{
    RollChange, RollChangeData, RollChangeDataRoll, SettingsChange, SocketResponse,
    decode_frame, parse_response,
};
