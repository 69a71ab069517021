//! Torrent lifecycle engine.
//!
//! Reconciles live swarm sessions with the durable catalog, restores
//! catalog-only torrents on demand, tears down idle sessions and drives the
//! disconnect/persist/reconnect sequence when swarm settings change.

mod cache;
mod clock;
mod connection;
mod hydration;
mod preload;
mod reconciler;
mod types;

pub use clock::{Clock, SystemClock};
pub use connection::ConnectionState;
pub use hydration::{HydrationState, HydrationToken, HydrationTracker};
pub use preload::{preload_budget, DEFAULT_PRELOAD_BYTES};
pub use reconciler::Engine;
pub use types::*;
