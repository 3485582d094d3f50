//! VPM Core - pairing and batch processing engine for Video Pair Manager
//!
//! Ingests video files, pairs recordings of the same event by creation
//! time and duration, and runs batch media processing over selected items.
//! Has no UI dependencies; the CLI and any other front end drive it through
//! the [`coordinator::Coordinator`].

pub mod config;
pub mod coordinator;
pub mod events;
pub mod extraction;
pub mod logging;
pub mod models;
pub mod pairing;
pub mod processing;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
