//! Client configuration.

use std::time::Duration;

use rollcall_tick::ReconnectPolicy;

/// Production command endpoint.
pub const DEFAULT_ENDPOINT_URL: &str = "https://us-central1-tdroller-1ac5a.cloudfunctions.net/gm";
/// Production realtime socket.
pub const DEFAULT_SOCKET_URL: &str =
    "wss://s-usc1f-nss-2549.firebaseio.com/.ws?v=5&ns=tdroller-1ac5a-default-rtdb";
/// SDK name declared to the realtime service after connecting.
pub const DEFAULT_SDK: &str = "sdk.js.9-4-1";
/// Idle time before a keepalive frame goes out.
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(45);

/// Where the dice roller lives and how to stay connected to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiceRollerConfig {
    pub endpoint_url: String,
    pub socket_url: String,
    pub sdk: String,
    pub keepalive: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for DiceRollerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            sdk: DEFAULT_SDK.to_string(),
            keepalive: DEFAULT_KEEPALIVE,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl DiceRollerConfig {
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    pub fn with_socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = url.into();
        self
    }

    pub fn with_sdk(mut self, sdk: impl Into<String>) -> Self {
        self.sdk = sdk.into();
        self
    }

    /// `Duration::ZERO` turns keepalives off.
    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}
