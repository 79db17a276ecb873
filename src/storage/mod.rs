//! Storage Engine
//!
//! Concurrent key-value store with per-entry expiry.

mod expiring_store;
mod removal;
mod sweeper;

pub use expiring_store::{ExpiringStore, MAX_EXPIRY};
pub use removal::{RemovalCause, RemovalListener};
