//! # Rollcall
//!
//! Client for a shared tabletop dice roller.
//!
//! A game master opens a roll cycle (initiative, attack or a saving throw),
//! players roll from their own devices, and the results appear live on
//! every screen and on the stream overlay. Rollcall keeps a realtime socket
//! to the roller, mirrors the table's roll state and rolls, and sends the
//! game master's commands.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollcall::prelude::*;
//!
//! # async fn demo() -> Result<(), RollcallError> {
//! let roller = DiceRoller::builder().build()?;
//! let _state = roller.on_state_change(|state| println!("table is {state}"));
//! let _rolls = roller.on_roll(|roll| println!("{} rolled {}", roll.class, roll.modified_result));
//!
//! roller.set_slot_id(Some("ABCDEF"))?;
//! tokio::spawn({
//!     let roller = roller.clone();
//!     async move { roller.run().await }
//! });
//!
//! roller.login("hunter2").await?;
//! roller.accept_rolls(RollType::Initiative).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | crate | role |
//! |-------|------|
//! | `rollcall-protocol` | socket frames and command bodies |
//! | `rollcall-transport` | connections and the socket task |
//! | `rollcall-session` | slot id, auth token, stores |
//! | `rollcall-rolls` | roll state machine and roll log |
//! | `rollcall-tick` | keepalive, reconnect backoff, shared ticker |

mod client;
mod command;
mod config;
mod error;
mod registry;

pub use client::{DiceRoller, DiceRollerBuilder, ErrorCallback, RollCallback, StateCallback};
pub use command::{CommandEndpoint, CommandError, HttpEndpoint};
pub use config::{
    DEFAULT_ENDPOINT_URL, DEFAULT_KEEPALIVE, DEFAULT_SDK, DEFAULT_SOCKET_URL, DiceRollerConfig,
};
pub use error::RollcallError;
pub use registry::{CallbackHandle, CallbackRegistry, Subscription};

pub use rollcall_protocol as protocol;
pub use rollcall_rolls as rolls;
pub use rollcall_session as session;
pub use rollcall_tick as tick;
pub use rollcall_transport as transport;

pub mod prelude {
    pub use crate::{
        CallbackHandle, CallbackRegistry, CommandEndpoint, CommandError, DiceRoller,
        DiceRollerBuilder, DiceRollerConfig, HttpEndpoint, RollcallError, Subscription,
    };
    pub use rollcall_protocol::{CommandRequest, CommandResponse};
    pub use rollcall_rolls::{
        AttackType, Class, Roll, RollDetail, RollState, RollType, SaveType,
    };
    pub use rollcall_session::{JsonFileStore, KeyValueStore, MemoryStore, SlotId};
    pub use rollcall_tick::{BackoffConfig, ReconnectPolicy, TickConfig, TickService};
    pub use rollcall_transport::{ConnectionState, Connector};
}
