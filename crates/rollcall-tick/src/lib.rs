//! Timers for rollcall.
//!
//! Three small pieces of time-driven machinery, all on the Tokio clock so
//! tests can run them under `tokio::time::pause()`:
//!
//! - [`Keepalive`]: a resettable one-period timer. The socket transport
//!   resets it on every send and writes a keepalive frame when it fires.
//! - [`ReconnectPolicy`] / [`Backoff`]: how long to wait before reopening a
//!   dropped connection, and when to give up.
//! - [`TickService`]: a shared once-per-second tick source that many
//!   subscribers can hang off without each owning a timer.
//!
//! # Integration
//!
//! The keepalive is designed to sit inside a connection task's
//! `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { conn.send(..).await?; keepalive.reset(); }
//!         () = keepalive.wait() => { conn.send(KEEPALIVE_FRAME).await?; }
//!     }
//! }
//! ```

mod backoff;
mod keepalive;
mod service;

pub use backoff::{Backoff, BackoffConfig, ReconnectPolicy};
pub use keepalive::Keepalive;
pub use service::{TickConfig, TickInfo, TickService, TickSubscription};
