//! Store Errors

use thiserror::Error;

/// Errors raised while building an [`ExpiringStore`](crate::ExpiringStore)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The configuration cannot produce a working store
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: &'static str },

    /// Sweeping is enabled but there is no Tokio runtime to run the sweeper on
    #[error("background sweep requires a Tokio runtime (construct the store inside one, or disable sweeping)")]
    RuntimeUnavailable,
}

/// Result alias used across the crate
pub type StoreResult<T> = Result<T, StoreError>;
