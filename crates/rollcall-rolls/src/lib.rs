//! The dice roller's domain model.
//!
//! Everything here is synchronous and free of I/O. The protocol layer
//! hands us classified frames; we turn them into the two things a UI cares
//! about:
//!
//! - **Where the table is in its roll cycle**: [`RollStateMachine`] folds
//!   partial settings updates into a [`RollState`], refusing to expose a
//!   combination it cannot make sense of.
//! - **What was rolled**: [`roll_from_update`] turns one reported die into a
//!   typed [`Roll`], and [`RollLog`] keeps the rolls of the current cycle.

mod error;
mod ingest;
mod log;
mod state;
mod types;

pub use error::RollError;
pub use ingest::{Roll, RollDetail, roll_from_update};
pub use log::RollLog;
pub use state::{RawRollState, RollStateMachine, Transition};
pub use types::{AttackType, Class, RollState, RollType, SaveType};
