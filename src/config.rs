//! Store Configuration

use std::time::Duration;

use crate::error::{StoreError, StoreResult};

/// Expiry applied when the caller does not pick one (2 minutes)
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(120);

/// Default pre-sizing hint for the value and deadline maps
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 4;

/// Store configuration
///
/// A zero `sweep_initial_delay` or `sweep_interval` disables the background
/// sweeper; expired entries are then only dropped when they are touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Pre-sizing hint, no effect on behaviour
    pub initial_capacity: usize,

    /// Time-to-live used by `insert` and by zero-duration explicit inserts
    pub default_expiry: Duration,

    /// Delay before the first sweep
    pub sweep_initial_delay: Duration,

    /// Period between sweeps
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            default_expiry: DEFAULT_EXPIRY,
            sweep_initial_delay: Duration::from_secs(1),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

impl StoreConfig {
    /// Create a config with the given default expiry
    pub fn new(default_expiry: Duration) -> Self {
        Self::default().with_default_expiry(default_expiry)
    }

    /// Set the initial capacity hint
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the default expiry
    pub fn with_default_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = expiry;
        self
    }

    /// Set the delay before the first sweep
    pub fn with_sweep_initial_delay(mut self, delay: Duration) -> Self {
        self.sweep_initial_delay = delay;
        self
    }

    /// Set the period between sweeps
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Disable the background sweeper (lazy expiry only)
    pub fn without_sweep(mut self) -> Self {
        self.sweep_interval = Duration::ZERO;
        self
    }

    /// Whether a background sweeper will be spawned for this config
    pub fn sweep_enabled(&self) -> bool {
        !self.sweep_initial_delay.is_zero() && !self.sweep_interval.is_zero()
    }

    /// Check the config can produce a store
    pub fn validate(&self) -> StoreResult<()> {
        if self.default_expiry.is_zero() {
            return Err(StoreError::InvalidConfiguration {
                reason: "default_expiry must be greater than zero",
            });
        }
        Ok(())
    }
}
