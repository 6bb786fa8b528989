//! Folding settings updates into a [`RollState`].
//!
//! The service reports its settings as five loose fields, any subset of
//! which can arrive in one update. [`RawRollState`] keeps the latest value
//! of each field; [`RollStateMachine`] resolves them into a [`RollState`]
//! after every update and only publishes combinations that make sense:
//!
//! ```text
//! rollState   extra fields needed            resolved state
//! ─────────   ─────────────────────────────  ─────────────────────────
//! disabled    showSlotIdInOBS                Disabled / ShowSlotId
//! accept      roll (+ saveRollType for save) Accept(roll type)
//! reveal      roll, reveal                   Reveal { roll type, complete }
//! other       -                              error
//! ```

use rollcall_protocol::SettingsChange;
use tracing::{debug, warn};

use crate::{RollError, RollState, RollType};

/// The latest value of each settings field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRollState {
    roll_state: String,
    roll: Option<String>,
    reveal: Option<String>,
    save_roll_type: Option<String>,
    show_slot_id_in_obs: bool,
}

impl Default for RawRollState {
    fn default() -> Self {
        Self {
            roll_state: "disabled".to_string(),
            roll: None,
            reveal: None,
            save_roll_type: None,
            show_slot_id_in_obs: false,
        }
    }
}

impl RawRollState {
    /// Overwrites every field present in `update`; absent fields keep their
    /// previous value.
    pub fn update_with(&mut self, update: &SettingsChange) {
        if let Some(roll_state) = &update.roll_state {
            self.roll_state.clone_from(roll_state);
        }
        if let Some(roll) = &update.roll {
            self.roll = Some(roll.clone());
        }
        if let Some(reveal) = &update.reveal {
            self.reveal = Some(reveal.clone());
        }
        if let Some(save_roll_type) = &update.save_roll_type {
            self.save_roll_type = Some(save_roll_type.clone());
        }
        if let Some(show) = update.show_slot_id_in_obs {
            self.show_slot_id_in_obs = show;
        }
    }

    /// The state these fields describe.
    pub fn resolve(&self) -> Result<RollState, RollError> {
        let roll_type =
            || RollType::from_wire(self.roll.as_deref(), self.save_roll_type.as_deref());

        let resolved = match self.roll_state.as_str() {
            "disabled" if self.show_slot_id_in_obs => Some(RollState::ShowSlotId),
            "disabled" => Some(RollState::Disabled),
            "accept" => roll_type().map(RollState::Accept),
            "reveal" => roll_type().zip(self.reveal_complete()).map(|(roll_type, complete)| {
                RollState::Reveal {
                    roll_type,
                    complete,
                }
            }),
            _ => None,
        };

        resolved.ok_or_else(|| RollError::UnresolvedState {
            roll_state: self.roll_state.clone(),
            roll: self.roll.clone(),
            reveal: self.reveal.clone(),
            save_roll_type: self.save_roll_type.clone(),
        })
    }

    fn reveal_complete(&self) -> Option<bool> {
        match self.reveal.as_deref()? {
            "instantly" => Some(true),
            "next" => Some(false),
            _ => None,
        }
    }

    pub fn roll_state(&self) -> &str {
        &self.roll_state
    }

    pub fn show_slot_id_in_obs(&self) -> bool {
        self.show_slot_id_in_obs
    }
}

/// Result of feeding the machine one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: RollState,
    pub current: RollState,
}

impl Transition {
    /// Whether the visible state is different from before.
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Accumulates settings updates and tracks the visible [`RollState`].
///
/// The visible state only ever moves to a fully resolved state. When an
/// update leaves the fields unresolvable, the update is still kept (the
/// fields mirror the service), the visible state stays where it was, and
/// the error is returned.
#[derive(Debug, Clone, Default)]
pub struct RollStateMachine {
    raw: RawRollState,
    state: RollState,
}

impl RollStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current visible state.
    pub fn state(&self) -> RollState {
        self.state
    }

    pub fn raw(&self) -> &RawRollState {
        &self.raw
    }

    /// Applies a partial settings update.
    pub fn apply(&mut self, update: &SettingsChange) -> Result<Transition, RollError> {
        let old = self.raw.clone();
        self.raw.update_with(update);
        self.settle(&old)
    }

    /// Forgets every field, as when no slot is selected.
    pub fn resync(&mut self) -> Result<Transition, RollError> {
        let old = std::mem::take(&mut self.raw);
        self.settle(&old)
    }

    fn settle(&mut self, old: &RawRollState) -> Result<Transition, RollError> {
        let previous = self.state;
        match self.raw.resolve() {
            Ok(current) => {
                self.state = current;
                debug!(old = ?old, new = ?self.raw, %previous, %current, "roll state change");
                Ok(Transition { previous, current })
            }
            Err(e) => {
                warn!(old = ?old, new = ?self.raw, error = %e, "roll state unresolvable");
                Err(e)
            }
        }
    }
}
