//! Expiring Store - Concurrent Key-Value Map with Per-Entry Deadlines
//!
//! Every entry carries a deadline. Expired entries are dropped lazily when a
//! read, existence check or view touches them, and periodically by a
//! background sweeper running on the Tokio runtime.
//!
//! ```rust,no_run
//! use expiring_store::{ExpiringStore, StoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), expiring_store::StoreError> {
//!     let config = StoreConfig::new(Duration::from_secs(30))
//!         .with_sweep_interval(Duration::from_secs(5));
//!     let store = ExpiringStore::new(config)?;
//!
//!     store.insert("session:42".to_string(), "alice".to_string());
//!     store.insert_with_expiry("otp:42".to_string(), "913204".to_string(), Duration::from_secs(60));
//!     assert_eq!(store.get("session:42").as_deref(), Some("alice"));
//!
//!     store.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use metrics::StoreMetrics;
pub use storage::{ExpiringStore, RemovalCause, RemovalListener, MAX_EXPIRY};
