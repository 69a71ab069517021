//! Swarm session layer.
//!
//! This module provides the `SessionManager` trait the engine drives, the
//! shared `LiveSession` handle, and the embedded librqbit backend.

mod librqbit;
mod live;
mod registry;
mod spec;
mod types;

pub use librqbit::LibrqbitSessionManager;
pub use live::{LiveSession, MetadataState, SessionMetadata, TorrentInfo};
pub use registry::SessionRegistry;
pub use spec::{is_safe_path_segment, InfoHash, SpecError, SpecSource, TorrentSpec};
pub use types::*;
