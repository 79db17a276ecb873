//! Expiry Sweeper
//!
//! Background task that periodically removes expired entries.

use parking_lot::Mutex;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::expiring_store::{StoreInner, MAX_EXPIRY};
use super::removal::RemovalCause;

/// Handle to the background sweep task
///
/// The task only holds the shared tables and a cancellation token, never a
/// store handle, so dropping the last store handle drops this and stops it.
pub(crate) struct Sweeper {
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawn the sweeper on `runtime`
    pub(crate) fn spawn<K, V>(
        runtime: &Handle,
        inner: Arc<StoreInner<K, V>>,
        initial_delay: Duration,
        period: Duration,
    ) -> Self
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let token = CancellationToken::new();
        let task = runtime.spawn(Self::run(inner, initial_delay, period, token.clone()));
        Self {
            token,
            task: Mutex::new(Some(task)),
        }
    }

    /// A sweeper with no task, for stores relying on lazy expiry only
    pub(crate) fn disabled() -> Self {
        Self {
            token: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    async fn run<K, V>(
        inner: Arc<StoreInner<K, V>>,
        initial_delay: Duration,
        period: Duration,
        token: CancellationToken,
    ) where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut ticker = interval_at(first_tick(Instant::now(), initial_delay), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(?initial_delay, ?period, "Expiry sweeper started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    // Shard locks block, keep them off the async workers
                    let inner = Arc::clone(&inner);
                    if let Err(err) = task::spawn_blocking(move || Self::sweep_once(&inner)).await {
                        warn!(%err, "Expiry sweep did not complete");
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }

    /// One scheduled run. A panic (e.g. from a removal listener) is contained
    /// here so later runs stay scheduled.
    fn sweep_once<K, V>(inner: &StoreInner<K, V>)
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| inner.purge_expired(RemovalCause::Swept))) {
            Ok(0) => {}
            Ok(removed) => debug!(removed = removed, "Swept expired keys"),
            Err(_) => {
                inner.metrics().record_sweep_failure();
                error!("Expiry sweep panicked, next run stays scheduled");
            }
        }
    }

    /// Cancel future runs; a run in progress completes
    pub(crate) fn stop(&self) {
        self.token.cancel();
    }

    /// Cancel future runs and wait for the task to exit
    pub(crate) async fn shutdown(&self) {
        self.token.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(%err, "Expiry sweeper exited abnormally");
            }
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the sweep task is still alive
    pub(crate) fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

/// First sweep time. The delay is capped like entry expiries so an absurd
/// value cannot overflow `Instant` inside the task.
fn first_tick(now: Instant, initial_delay: Duration) -> Instant {
    now.checked_add(initial_delay.min(MAX_EXPIRY)).unwrap_or_else(|| {
        warn!(?initial_delay, "Sweep initial delay out of range, sweeping now");
        now
    })
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
