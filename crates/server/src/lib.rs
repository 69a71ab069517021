//! HTTP surface for the torrhub engine.

pub mod api;
pub mod metrics;
pub mod state;
