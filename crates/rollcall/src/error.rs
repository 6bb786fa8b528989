//! Unified error type for rollcall.

use rollcall_rolls::RollError;
use rollcall_session::SessionError;

use crate::command::CommandError;

/// Top-level error: the session and command errors callers can hit, plus
/// the failures the dice roller reports to its user.
///
/// Every error that reaches the error channel is published as the pair
/// `(user_message(), requires_login())`.
#[derive(Debug, thiserror::Error)]
pub enum RollcallError {
    /// A session-level error (slot id format, stores).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The command endpoint could not be reached or answered garbage.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The realtime socket failed while carrying one of our requests.
    #[error("{0}")]
    Socket(String),

    /// The client was built without a way to reach the command endpoint.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("No slot ID")]
    NoSlotId,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Already logged in")]
    AlreadyLoggedIn,

    /// The endpoint refused the password. Carries its message verbatim.
    #[error("{0}")]
    LoginRejected(String),

    /// A command was sent but did not succeed. `detail` is for logs; the
    /// user only ever sees the generic message.
    #[error("Error with the dice roller - try logging in again")]
    CommandFailed { detail: String },

    /// The settings pushed by the service no longer describe a state we
    /// understand.
    #[error("Dice roller is in an unexpected state - suggest reloading the page")]
    UnexpectedState(#[source] RollError),

    /// Reconnection gave up.
    #[error("Lost connection to the dice roller - reload the page")]
    ConnectionLost,
}

impl RollcallError {
    /// The text published on the error channel.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether the error suggests the stored credential is no longer good
    /// and the user should log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::NotLoggedIn | Self::CommandFailed { .. })
    }
}
