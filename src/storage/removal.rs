//! Removal Notifications
//!
//! Hook invoked when an entry is dropped because its deadline passed.

use std::fmt;
use std::sync::Arc;

/// Why an entry left the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Found expired by a read, existence check or view
    Expired,
    /// Dropped by a sweep run
    Swept,
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalCause::Expired => write!(f, "expired"),
            RemovalCause::Swept => write!(f, "swept"),
        }
    }
}

/// Callback invoked with each expired entry after it has been removed.
///
/// Runs on the thread that evicted the entry (a caller thread for
/// [`RemovalCause::Expired`], a Tokio blocking-pool thread for
/// [`RemovalCause::Swept`]), with no store locks held. Explicit `remove` and `clear` do not notify.
pub type RemovalListener<K, V> = Arc<dyn Fn(&K, &V, RemovalCause) + Send + Sync>;
