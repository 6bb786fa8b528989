//! Who we are and which slot we watch.
//!
//! This crate holds the client's identity between runs:
//!
//! 1. **Slot identity**: [`SlotId`], the six-letter code of the remote
//!    dice session to follow.
//! 2. **Authentication**: [`AuthToken`], the opaque token returned by a
//!    successful login.
//! 3. **Persistence**: [`KeyValueStore`] backends. The token lives in a
//!    short-lived session store ([`MemoryStore`]); the slot id lives in a
//!    durable archive ([`JsonFileStore`]).
//!
//! [`Credentials`] ties the three together.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)  ← reads credentials before every command, swaps slots
//!     ↕
//! Session Layer (this crate)  ← owns token + slot id and their storage
//! ```

mod credentials;
mod error;
mod slot;
mod store;

pub use credentials::{ARCHIVE_KEY, AUTH_TOKEN_KEY, Credentials, SlotChange};
pub use error::SessionError;
pub use slot::{AuthToken, SlotId};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
