//! Event system for buildcast
//!
//! Structured events emitted while a construction sequence is generated,
//! and a broadcast bus for anyone who wants to follow along.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
