//! Bodies for the HTTP command endpoint.
//!
//! Every command is one JSON POST, discriminated by its `action` field.
//! All commands except `login` carry the auth token and the target slot.

use serde::{Deserialize, Serialize};

/// A request to the command endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action")]
pub enum CommandRequest {
    #[serde(rename = "login")]
    Login { password: String },

    #[serde(rename = "acceptRolls", rename_all = "camelCase")]
    AcceptRolls {
        auth_token: String,
        slot_id: String,
        /// `initiative_roll`, `attack_roll` or `save_roll`.
        roll: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        save_roll_type: Option<String>,
    },

    #[serde(rename = "revealRolls", rename_all = "camelCase")]
    RevealRolls {
        auth_token: String,
        slot_id: String,
        /// `instantly` or `next`.
        reveal: String,
    },

    #[serde(rename = "resetRolls", rename_all = "camelCase")]
    ResetRolls { auth_token: String, slot_id: String },

    #[serde(rename = "showSlotIdInOBS", rename_all = "camelCase")]
    ShowSlotIdInObs {
        auth_token: String,
        slot_id: String,
        show: bool,
    },
}

impl CommandRequest {
    /// The wire name of the command, for log fields.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::AcceptRolls { .. } => "acceptRolls",
            Self::RevealRolls { .. } => "revealRolls",
            Self::ResetRolls { .. } => "resetRolls",
            Self::ShowSlotIdInObs { .. } => "showSlotIdInOBS",
        }
    }
}

/// The endpoint's reply. A present `error` means the command failed,
/// whatever `success` says.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl CommandResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
