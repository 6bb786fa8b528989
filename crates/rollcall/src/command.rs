//! The HTTP command endpoint.
//!
//! Commands that change the table (log in, open a roll cycle, reveal,
//! reset, toggle the overlay) are one JSON POST each. Results come back
//! through the realtime socket, not through the response body; the body
//! only says whether the command was taken.

use std::future::Future;

use rollcall_protocol::{CommandRequest, CommandResponse};
use tracing::debug;

use crate::DiceRollerConfig;

/// Failure to get an answer from the command endpoint. A reply that
/// carries an `error` is an answer, not a [`CommandError`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("command request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("command endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Sends commands somewhere that answers them.
pub trait CommandEndpoint: Send + Sync + 'static {
    fn execute(
        &self,
        request: &CommandRequest,
    ) -> impl Future<Output = Result<CommandResponse, CommandError>> + Send;

    /// An endpoint built from configuration alone, for builders that were
    /// not handed one explicitly. `None` when the type needs more than
    /// configuration.
    fn from_config(config: &DiceRollerConfig) -> Option<Self>
    where
        Self: Sized,
    {
        let _ = config;
        None
    }
}

/// [`CommandEndpoint`] that POSTs JSON over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Uses an existing client (shared pool, proxies, timeouts).
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CommandEndpoint for HttpEndpoint {
    async fn execute(&self, request: &CommandRequest) -> Result<CommandResponse, CommandError> {
        debug!(action = request.action(), url = %self.url, "sending command");
        // The endpoint reports failures in the body, whatever the status.
        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body: CommandResponse = response.json().await?;
        debug!(
            action = request.action(),
            %status,
            success = body.success,
            error = ?body.error,
            "command answered"
        );
        Ok(body)
    }

    fn from_config(config: &DiceRollerConfig) -> Option<Self> {
        Some(Self::new(config.endpoint_url.clone()))
    }
}
