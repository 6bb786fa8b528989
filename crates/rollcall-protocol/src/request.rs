//! Outbound realtime frames.
//!
//! The realtime service uses a terse single-letter schema. Every request
//! we send is wrapped in a data frame:
//!
//! ```text
//! {"t":"d","d":{"a":"q","b":{"p":"/slots/ABCDEF/rolls","h":""},"r":3}}
//!   │          │    │                                          └─ request sequence number
//!   │          │    └─ payload (path or SDK declaration)
//!   │          └─ verb: s = declare SDK, q = listen, n = unlisten
//!   └─ frame type: d = data
//! ```
//!
//! The request id is *not* chosen here. The transport stamps it at the
//! moment the frame actually leaves, so ids are strictly increasing in wire
//! order even when frames were queued before the socket opened.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// The no-op frame sent periodically to keep the socket alive.
pub const KEEPALIVE_FRAME: &str = "0";

/// What a request asks the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestVerb {
    /// Announce which client SDK we speak. Sent first on every connection.
    #[serde(rename = "s")]
    DeclareSdk,
    /// Start receiving updates for a path.
    #[serde(rename = "q")]
    Listen,
    /// Stop receiving updates for a path.
    #[serde(rename = "n")]
    Unlisten,
}

/// The two per-slot subtrees a client subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotPath {
    Rolls,
    Settings,
}

impl SlotPath {
    /// Both subtrees, in subscription order.
    pub const ALL: [SlotPath; 2] = [SlotPath::Settings, SlotPath::Rolls];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rolls => "rolls",
            Self::Settings => "settings",
        }
    }

    /// The full service path for this subtree of `slot_id`.
    pub fn for_slot(self, slot_id: &str) -> String {
        format!("/slots/{slot_id}/{}", self.as_str())
    }
}

impl fmt::Display for SlotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `b` body of a request.
///
/// `#[serde(untagged)]` serializes each variant as just its fields, which is
/// what the service expects: `{"c":{...}}` or `{"p":"...","h":""}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestPayload {
    Sdk {
        c: BTreeMap<String, u8>,
    },
    Path {
        p: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        h: Option<String>,
    },
}

/// One outbound realtime request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMessage {
    #[serde(rename = "a")]
    pub verb: RequestVerb,
    #[serde(rename = "b")]
    pub payload: RequestPayload,
    /// Sequence number, 0 until the transport sends the message.
    #[serde(rename = "r")]
    pub request_id: u64,
}

impl RequestMessage {
    /// Declares the client SDK version string.
    pub fn sdk(sdk: &str) -> Self {
        Self {
            verb: RequestVerb::DeclareSdk,
            payload: RequestPayload::Sdk {
                c: BTreeMap::from([(sdk.to_string(), 1)]),
            },
            request_id: 0,
        }
    }

    /// Starts (`listen = true`) or stops listening to a slot subtree.
    ///
    /// Listen requests carry an empty hash (`h: ""`), meaning "send me
    /// everything"; unlisten requests omit it.
    pub fn listen(listen: bool, path: SlotPath, slot_id: &str) -> Self {
        let (verb, h) = if listen {
            (RequestVerb::Listen, Some(String::new()))
        } else {
            (RequestVerb::Unlisten, None)
        };
        Self {
            verb,
            payload: RequestPayload::Path {
                p: path.for_slot(slot_id),
                h,
            },
            request_id: 0,
        }
    }

    /// Returns the message stamped with `request_id`.
    pub fn with_request_id(mut self, request_id: u64) -> Self {
        self.request_id = request_id;
        self
    }

    /// The subscribed path, if this is a listen/unlisten request.
    pub fn path(&self) -> Option<&str> {
        match &self.payload {
            RequestPayload::Path { p, .. } => Some(p),
            RequestPayload::Sdk { .. } => None,
        }
    }

    /// Wraps the message in the `{"t":"d","d":...}` data frame.
    pub fn to_frame(&self) -> OutboundFrame<'_> {
        OutboundFrame { t: "d", d: self }
    }
}

/// A request wrapped for the wire. Borrowed so encoding never clones.
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a> {
    t: &'static str,
    d: &'a RequestMessage,
}
