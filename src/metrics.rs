//! Store Metrics
//!
//! Lookup, expiry and sweep counters plus sweep latency tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector shared by the store handles and the sweeper
#[derive(Debug)]
pub struct StoreMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,

    /// Entries dropped by the lazy path
    expired: AtomicU64,
    /// Entries dropped by the background sweeper
    swept: AtomicU64,

    sweep_runs: AtomicU64,
    sweep_failures: AtomicU64,

    /// Sweep latency tracking (simplified)
    sweep_sum_us: AtomicU64,
    sweep_min_us: AtomicU64,
    sweep_max_us: AtomicU64,
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            swept: AtomicU64::new(0),
            sweep_runs: AtomicU64::new(0),
            sweep_failures: AtomicU64::new(0),
            sweep_sum_us: AtomicU64::new(0),
            sweep_min_us: AtomicU64::new(u64::MAX),
            sweep_max_us: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_lookup(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_swept(&self) {
        self.swept.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep_failure(&self) {
        self.sweep_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed sweep run
    pub(crate) fn record_sweep(&self, elapsed: Duration) {
        self.sweep_runs.fetch_add(1, Ordering::Relaxed);

        let elapsed_us = elapsed.as_micros() as u64;
        self.sweep_sum_us.fetch_add(elapsed_us, Ordering::Relaxed);

        // Update min (atomic min)
        let mut current_min = self.sweep_min_us.load(Ordering::Relaxed);
        while elapsed_us < current_min {
            match self.sweep_min_us.compare_exchange_weak(
                current_min,
                elapsed_us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(c) => current_min = c,
            }
        }

        // Update max (atomic max)
        let mut current_max = self.sweep_max_us.load(Ordering::Relaxed);
        while elapsed_us > current_max {
            match self.sweep_max_us.compare_exchange_weak(
                current_max,
                elapsed_us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(c) => current_max = c,
            }
        }
    }

    /// Lookups that found a live entry
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing, or only an expired entry
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Total inserts, including overwrites
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Entries removed on access after their deadline passed
    pub fn expired(&self) -> u64 {
        self.expired.load(Ordering::Relaxed)
    }

    /// Entries removed by the background sweeper
    pub fn swept(&self) -> u64 {
        self.swept.load(Ordering::Relaxed)
    }

    /// Completed sweep runs (manual and scheduled)
    pub fn sweep_runs(&self) -> u64 {
        self.sweep_runs.load(Ordering::Relaxed)
    }

    /// Scheduled sweep runs that panicked
    pub fn sweep_failures(&self) -> u64 {
        self.sweep_failures.load(Ordering::Relaxed)
    }

    /// Get average sweep latency in microseconds
    pub fn avg_sweep_us(&self) -> f64 {
        let count = self.sweep_runs();
        if count == 0 {
            return 0.0;
        }
        let sum = self.sweep_sum_us.load(Ordering::Relaxed);
        sum as f64 / count as f64
    }

    /// Get min sweep latency in microseconds
    pub fn min_sweep_us(&self) -> u64 {
        let min = self.sweep_min_us.load(Ordering::Relaxed);
        if min == u64::MAX {
            0
        } else {
            min
        }
    }

    /// Get max sweep latency in microseconds
    pub fn max_sweep_us(&self) -> u64 {
        self.sweep_max_us.load(Ordering::Relaxed)
    }

    /// Get a summary of metrics
    pub fn summary(&self) -> String {
        format!(
            "Lookups: {} hit / {} miss | Inserts: {} | Evicted: {} lazy, {} swept | Sweeps: {} ({} failed), latency (µs): avg={:.1}, min={}, max={}",
            self.hits(),
            self.misses(),
            self.inserts(),
            self.expired(),
            self.swept(),
            self.sweep_runs(),
            self.sweep_failures(),
            self.avg_sweep_us(),
            self.min_sweep_us(),
            self.max_sweep_us()
        )
    }
}
