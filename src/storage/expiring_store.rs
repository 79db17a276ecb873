//! Expiring Key-Value Store
//!
//! Concurrent map where every entry carries a deadline. Expired entries are
//! dropped lazily when touched and periodically by the background sweeper.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use super::removal::{RemovalCause, RemovalListener};
use super::sweeper::Sweeper;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::metrics::StoreMetrics;

/// Longest time-to-live applied to an entry (~100 years).
/// Keeps `Instant` arithmetic in range for absurd durations.
pub const MAX_EXPIRY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Tables shared between store handles and the sweeper task.
///
/// Lock order: per-key work locks the `values` shard first and touches
/// `deadlines` while still holding it. Nothing acquires a `values` lock while
/// holding a `deadlines` lock, so a key is never seen in one table only.
pub(crate) struct StoreInner<K, V> {
    values: DashMap<K, V>,
    deadlines: DashMap<K, Instant>,
    default_expiry: Duration,
    listener: Option<RemovalListener<K, V>>,
    metrics: StoreMetrics,
}

impl<K, V> StoreInner<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn new(config: &StoreConfig, listener: Option<RemovalListener<K, V>>) -> Self {
        Self {
            values: DashMap::with_capacity(config.initial_capacity),
            deadlines: DashMap::with_capacity(config.initial_capacity),
            default_expiry: config.default_expiry,
            listener,
            metrics: StoreMetrics::new(),
        }
    }

    pub(crate) fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Zero means "use the default expiry", never "already expired".
    fn deadline_after(&self, now: Instant, expiry: Duration) -> Instant {
        let expiry = if expiry.is_zero() {
            self.default_expiry
        } else {
            expiry
        };
        now + expiry.min(MAX_EXPIRY)
    }

    fn is_live<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.deadlines
            .get(key)
            .is_some_and(|deadline| now < *deadline)
    }

    fn insert(&self, key: K, value: V, expiry: Duration) -> Option<V> {
        let now = Instant::now();
        let deadline = self.deadline_after(now, expiry);
        self.metrics.record_insert();

        let mut stale = None;
        let previous = match self.values.entry(key) {
            Entry::Occupied(mut occupied) => {
                let old_deadline = self.deadlines.insert(occupied.key().clone(), deadline);
                let old = occupied.insert(value);
                if old_deadline.is_some_and(|d| now < d) {
                    Some(old)
                } else {
                    stale = Some((occupied.key().clone(), old));
                    None
                }
            }
            Entry::Vacant(vacant) => {
                self.deadlines.insert(vacant.key().clone(), deadline);
                vacant.insert(value);
                None
            }
        };

        // An overwritten entry that had already expired counts as an eviction
        if let Some((key, old)) = stale {
            self.on_evicted(&key, &old, RemovalCause::Expired);
        }
        previous
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let lookup = self
            .values
            .get(key)
            .map(|entry| self.is_live::<K>(entry.key(), now).then(|| entry.value().clone()));

        match lookup {
            Some(Some(value)) => {
                self.metrics.record_lookup(true);
                Some(value)
            }
            Some(None) => {
                self.evict_if_expired(key, now, RemovalCause::Expired);
                self.metrics.record_lookup(false);
                None
            }
            None => {
                self.metrics.record_lookup(false);
                None
            }
        }
    }

    fn expires_in<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let deadline = self
            .values
            .get(key)
            .and_then(|entry| self.deadlines.get::<K>(entry.key()).map(|d| *d))?;

        if now < deadline {
            Some(deadline - now)
        } else {
            self.evict_if_expired(key, now, RemovalCause::Expired);
            None
        }
    }

    fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values
            .remove_if(key, |k, _| {
                self.deadlines.remove::<K>(k);
                true
            })
            .map(|(_, value)| value)
    }

    /// Remove `key` from both tables if its deadline is at or before `now`.
    ///
    /// The deadline is re-read under the value lock, so an entry refreshed by
    /// a concurrent insert after `now` is left alone.
    fn evict_if_expired<Q>(&self, key: &Q, now: Instant, cause: RemovalCause) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let evicted = self.values.remove_if(key, |k, _| {
            self.deadlines
                .remove_if::<K>(k, |_, deadline| now >= *deadline)
                .is_some()
        });

        match evicted {
            Some((key, value)) => {
                self.on_evicted(&key, &value, cause);
                true
            }
            None => false,
        }
    }

    /// Runs with no table locks held.
    fn on_evicted(&self, key: &K, value: &V, cause: RemovalCause) {
        trace!(%cause, "Evicted expired entry");
        match cause {
            RemovalCause::Expired => self.metrics.record_expired(),
            RemovalCause::Swept => self.metrics.record_swept(),
        }
        if let Some(listener) = &self.listener {
            listener(key, value, cause);
        }
    }

    /// Visit live entries until `visit` breaks, then evict the expired
    /// entries met along the way.
    fn scan_live<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> ControlFlow<()>,
    {
        let now = Instant::now();
        let mut expired = Vec::new();

        for entry in self.values.iter() {
            if !self.is_live(entry.key(), now) {
                expired.push(entry.key().clone());
            } else if visit(entry.key(), entry.value()).is_break() {
                break;
            }
        }

        for key in expired {
            self.evict_if_expired(&key, now, RemovalCause::Expired);
        }
    }

    /// Remove every entry whose deadline has passed, returns count of removed entries.
    ///
    /// Candidates are collected one `deadlines` shard at a time, then each is
    /// evicted under its own key lock, so no lock spans the whole table.
    pub(crate) fn purge_expired(&self, cause: RemovalCause) -> usize {
        let started = Instant::now();
        let candidates: Vec<K> = self
            .deadlines
            .iter()
            .filter(|entry| started >= *entry.value())
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in &candidates {
            if self.evict_if_expired(key, started, cause) {
                removed += 1;
            }
        }

        self.metrics.record_sweep(started.elapsed());
        removed
    }

    fn clear(&self) {
        self.values.retain(|key, _| {
            self.deadlines.remove(key);
            false
        });
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        assert_eq!(self.values.len(), self.deadlines.len());
        for entry in self.values.iter() {
            assert!(self.deadlines.contains_key(entry.key()));
        }
    }
}

/// Thread-safe key-value store with per-entry expiry
///
/// Every entry carries a deadline. Reads, existence checks and views treat an
/// entry whose deadline has passed as absent and remove it on the spot. A
/// background sweeper, spawned on the current Tokio runtime, also removes
/// expired entries on a fixed schedule so untouched keys do not pile up.
///
/// Single-key operations are atomic per key: the value and its deadline are
/// always written and removed together. Cross-key operations (`put_all`,
/// `len`, the views, `clear`) are not atomic as a whole and may observe
/// concurrent writes part way through.
///
/// Handles are cheap to clone and share the same tables. The sweeper stops
/// on [`close`](Self::close) or once the last handle is dropped.
pub struct ExpiringStore<K, V> {
    inner: Arc<StoreInner<K, V>>,
    sweeper: Arc<Sweeper>,
}

impl<K, V> Clone for ExpiringStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            sweeper: Arc::clone(&self.sweeper),
        }
    }
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new store
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `default_expiry` is zero, `RuntimeUnavailable`
    /// if sweeping is enabled and no Tokio runtime is current.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        Self::build(config, None)
    }

    /// Create a new store that reports every expired entry to `listener`
    pub fn with_listener<F>(config: StoreConfig, listener: F) -> StoreResult<Self>
    where
        F: Fn(&K, &V, RemovalCause) + Send + Sync + 'static,
    {
        let listener: RemovalListener<K, V> = Arc::new(listener);
        Self::build(config, Some(listener))
    }

    fn build(config: StoreConfig, listener: Option<RemovalListener<K, V>>) -> StoreResult<Self> {
        if let Err(err) = config.validate() {
            warn!(%err, "Rejected store configuration");
            return Err(err);
        }

        let inner = Arc::new(StoreInner::new(&config, listener));
        let sweeper = if config.sweep_enabled() {
            let runtime = Handle::try_current().map_err(|_| StoreError::RuntimeUnavailable)?;
            Sweeper::spawn(
                &runtime,
                Arc::clone(&inner),
                config.sweep_initial_delay,
                config.sweep_interval,
            )
        } else {
            debug!("Background sweep disabled, relying on lazy expiry");
            Sweeper::disabled()
        };

        Ok(Self {
            inner,
            sweeper: Arc::new(sweeper),
        })
    }

    /// Insert with the default expiry.
    ///
    /// Returns the previous value if it existed and had not expired.
    #[inline]
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value, self.inner.default_expiry)
    }

    /// Insert with an explicit expiry.
    ///
    /// A zero `expiry` falls back to the default expiry; it never creates an
    /// entry that is expired on arrival. Durations are capped at [`MAX_EXPIRY`].
    #[inline]
    pub fn insert_with_expiry(&self, key: K, value: V, expiry: Duration) -> Option<V> {
        self.inner.insert(key, value, expiry)
    }

    /// Insert every pair with the default expiry. Not atomic across pairs.
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    /// Get value by key, returns None if key doesn't exist or is expired
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    /// Check if key exists and is not expired
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key).is_some()
    }

    /// Check if any live entry holds `value`
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let mut found = false;
        self.inner.scan_live(|_, candidate| {
            if candidate == value {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// Remaining time-to-live of a live key
    pub fn expires_in<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.expires_in(key)
    }

    /// Delete key, returns the value it held (expired or not)
    #[inline]
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key)
    }

    /// Number of live entries.
    ///
    /// Walks the whole table and evicts expired entries it meets. Use
    /// [`physical_len`](Self::physical_len) for a cheap count that may include
    /// entries still waiting for a sweep.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.inner.scan_live(|_, _| {
            count += 1;
            ControlFlow::Continue(())
        });
        count
    }

    /// Check if store has no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn physical_len(&self) -> usize {
        self.inner.values.len()
    }

    /// Snapshot of live keys, in no particular order
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::new();
        self.inner.scan_live(|key, _| {
            keys.push(key.clone());
            ControlFlow::Continue(())
        });
        keys
    }

    /// Snapshot of live values, in no particular order
    pub fn values(&self) -> Vec<V> {
        let mut values = Vec::new();
        self.inner.scan_live(|_, value| {
            values.push(value.clone());
            ControlFlow::Continue(())
        });
        values
    }

    /// Snapshot of live entries, in no particular order
    pub fn entries(&self) -> Vec<(K, V)> {
        let mut entries = Vec::new();
        self.inner.scan_live(|key, value| {
            entries.push((key.clone(), value.clone()));
            ControlFlow::Continue(())
        });
        entries
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Remove expired entries now, returns count of removed entries
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired(RemovalCause::Swept)
    }

    /// Stop the background sweeper.
    ///
    /// A sweep already running completes; no new one starts. The store stays
    /// usable with lazy expiry only. Calling this more than once is harmless.
    pub fn close(&self) {
        self.sweeper.stop();
    }

    /// Stop the background sweeper and wait for its task to exit
    pub async fn shutdown(&self) {
        self.sweeper.shutdown().await;
    }

    /// Whether `close` or `shutdown` has been called
    pub fn is_closed(&self) -> bool {
        self.sweeper.is_stopped()
    }

    /// Whether a background sweep task is alive for this store
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Lookup, expiry and sweep counters
    pub fn metrics(&self) -> &StoreMetrics {
        self.inner.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::thread;

    fn lazy_store(expiry_ms: u64) -> ExpiringStore<String, String> {
        ExpiringStore::new(StoreConfig::new(Duration::from_millis(expiry_ms)).without_sweep())
            .unwrap()
    }

    fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
        items.sort();
        items
    }

    #[test]
    fn test_basic_operations() {
        let store = lazy_store(60_000);

        // Insert and get
        assert_eq!(store.insert("key".into(), "value".into()), None);
        assert_eq!(store.get("key"), Some("value".to_string()));

        // Exists
        assert!(store.contains_key("key"));

        // Remove
        assert_eq!(store.remove("key"), Some("value".to_string()));
        assert!(!store.contains_key("key"));
        assert_eq!(store.get("key"), None);
        assert_eq!(store.remove("key"), None);
    }

    #[test]
    fn test_borrowed_key_lookups() {
        let store = lazy_store(30);
        let key = String::from("user:1");

        store.insert(key.clone(), "alice".into());
        assert_eq!(store.get("user:1"), Some("alice".to_string()));
        assert_eq!(store.get(&key), Some("alice".to_string()));
        assert!(store.expires_in("user:1").is_some());
        assert_eq!(store.remove("user:1"), Some("alice".to_string()));

        store.insert(key.clone(), "bob".into());
        thread::sleep(Duration::from_millis(60));
        assert_eq!(store.expires_in("user:1"), None);
        assert_eq!(store.physical_len(), 0);
        store.inner.assert_consistent();
    }

    #[test]
    fn test_insert_returns_live_previous_value() {
        let store = lazy_store(60_000);

        store.insert("key".into(), "v1".into());
        assert_eq!(store.insert("key".into(), "v2".into()), Some("v1".to_string()));
        assert_eq!(store.get("key"), Some("v2".to_string()));
    }

    #[test]
    fn test_insert_over_expired_value_returns_none() {
        let store = lazy_store(30);

        store.insert("key".into(), "v1".into());
        thread::sleep(Duration::from_millis(60));

        assert_eq!(store.insert("key".into(), "v2".into()), None);
        assert_eq!(store.get("key"), Some("v2".to_string()));
        assert_eq!(store.metrics().expired(), 1);
    }

    #[test]
    fn test_lazy_expiry_on_get() {
        let store = lazy_store(30);

        store.insert("expiring".into(), "temporary".into());
        assert_eq!(store.get("expiring"), Some("temporary".to_string()));

        thread::sleep(Duration::from_millis(60));
        // Still physically present, but never observable
        assert_eq!(store.physical_len(), 1);
        assert_eq!(store.get("expiring"), None);
        assert_eq!(store.physical_len(), 0);

        // Repeated reads of an expired key stay safe
        assert_eq!(store.get("expiring"), None);
        assert!(!store.contains_key("expiring"));
        assert_eq!(store.metrics().expired(), 1);
        store.inner.assert_consistent();
    }

    #[test]
    fn test_missing_key_has_no_side_effects() {
        let store = lazy_store(60_000);
        store.insert("present".into(), "value".into());

        assert_eq!(store.get("absent"), None);
        assert!(!store.contains_key("absent"));
        assert_eq!(store.expires_in("absent"), None);
        assert_eq!(store.physical_len(), 1);
        assert_eq!(store.metrics().misses(), 2);
    }

    #[test]
    fn test_zero_expiry_uses_default() {
        let store = lazy_store(200);

        store.insert_with_expiry("x".into(), "value".into(), Duration::ZERO);
        assert_eq!(store.get("x"), Some("value".to_string()));

        let remaining = store.expires_in("x").unwrap();
        assert!(remaining > Duration::from_millis(100));
        assert!(remaining <= Duration::from_millis(200));
    }

    #[test]
    fn test_explicit_expiry_overrides_default() {
        let store = lazy_store(60_000);

        store.insert_with_expiry("short".into(), "value".into(), Duration::from_millis(30));
        store.insert("long".into(), "value".into());
        thread::sleep(Duration::from_millis(60));

        assert!(!store.contains_key("short"));
        assert!(store.contains_key("long"));
    }

    #[test]
    fn test_huge_expiry_is_capped() {
        let store = lazy_store(60_000);

        store.insert_with_expiry("forever".into(), "value".into(), Duration::MAX);
        assert_eq!(store.get("forever"), Some("value".to_string()));
        assert!(store.expires_in("forever").unwrap() <= MAX_EXPIRY);
    }

    #[test]
    fn test_remove_ignores_deadline() {
        let store = lazy_store(30);

        store.insert("key".into(), "value".into());
        thread::sleep(Duration::from_millis(60));

        assert_eq!(store.remove("key"), Some("value".to_string()));
        assert_eq!(store.get("key"), None);
        assert_eq!(store.physical_len(), 0);
        store.inner.assert_consistent();
    }

    #[test]
    fn test_put_all() {
        let store: ExpiringStore<&str, i32> =
            ExpiringStore::new(StoreConfig::new(Duration::from_secs(60)).without_sweep()).unwrap();

        store.put_all([("a", 1), ("b", 2)]);
        assert!(store.contains_key("a") && store.contains_key("b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_len_counts_only_live_entries() {
        let store = lazy_store(60_000);

        for i in 0..3 {
            store.insert_with_expiry(format!("short{}", i), "v".into(), Duration::from_millis(20));
        }
        store.insert("long1".into(), "v".into());
        store.insert("long2".into(), "v".into());
        assert_eq!(store.len(), 5);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(store.physical_len(), 5);
        assert_eq!(store.len(), 2);
        // The scan evicted what it found expired
        assert_eq!(store.physical_len(), 2);
        assert!(!store.is_empty());

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_views_skip_expired_entries() {
        let store = lazy_store(60_000);

        store.insert("a".into(), "1".into());
        store.insert("b".into(), "2".into());
        store.insert_with_expiry("gone".into(), "3".into(), Duration::from_millis(20));
        thread::sleep(Duration::from_millis(50));

        assert_eq!(sorted(store.keys()), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sorted(store.values()), vec!["1".to_string(), "2".to_string()]);
        assert_eq!(
            sorted(store.entries()),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
        assert_eq!(store.physical_len(), 2);
        store.inner.assert_consistent();
    }

    #[test]
    fn test_contains_value() {
        let store = lazy_store(60_000);

        store.insert("a".into(), "live".into());
        store.insert_with_expiry("b".into(), "stale".into(), Duration::from_millis(20));
        thread::sleep(Duration::from_millis(50));

        assert!(store.contains_value(&"live".to_string()));
        assert!(!store.contains_value(&"stale".to_string()));
        assert!(!store.contains_value(&"never".to_string()));
    }

    #[test]
    fn test_clear() {
        let store = lazy_store(60_000);

        for i in 0..10 {
            store.insert(format!("key{}", i), format!("value{}", i));
        }
        store.clear();

        assert_eq!(store.physical_len(), 0);
        assert_eq!(store.get("key0"), None);
        store.inner.assert_consistent();
    }

    #[test]
    fn test_purge_expired() {
        let store = lazy_store(60_000);

        for i in 0..10 {
            store.insert_with_expiry(format!("key{}", i), "v".into(), Duration::from_millis(10));
        }
        store.insert("keep".into(), "v".into());

        thread::sleep(Duration::from_millis(40));
        assert_eq!(store.purge_expired(), 10);
        assert_eq!(store.physical_len(), 1);
        assert_eq!(store.metrics().swept(), 10);
        assert_eq!(store.metrics().sweep_runs(), 1);
    }

    #[test]
    fn test_purge_keeps_refreshed_entries() {
        let store = lazy_store(30);

        store.insert("key".into(), "old".into());
        thread::sleep(Duration::from_millis(60));
        store.insert_with_expiry("key".into(), "new".into(), Duration::from_secs(10));

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.get("key"), Some("new".to_string()));
    }

    #[test]
    fn test_listener_receives_expired_entries() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let store = ExpiringStore::with_listener(
            StoreConfig::new(Duration::from_millis(20)).without_sweep(),
            move |key: &String, value: &String, cause| {
                sink.lock().push((key.clone(), value.clone(), cause));
            },
        )
        .unwrap();

        store.insert("lazy".into(), "1".into());
        store.insert("swept".into(), "2".into());
        store.insert("removed".into(), "3".into());
        store.remove("removed");
        thread::sleep(Duration::from_millis(50));

        assert_eq!(store.get("lazy"), None);
        assert_eq!(store.purge_expired(), 1);

        let seen = seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                ("lazy".to_string(), "1".to_string(), RemovalCause::Expired),
                ("swept".to_string(), "2".to_string(), RemovalCause::Swept),
            ]
        );
    }

    #[test]
    fn test_zero_default_expiry_is_rejected() {
        let result = ExpiringStore::<String, String>::new(StoreConfig::new(Duration::ZERO));
        assert!(matches!(
            result,
            Err(StoreError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_sweep_requires_runtime() {
        let result = ExpiringStore::<String, String>::new(StoreConfig::new(Duration::from_secs(1)));
        assert!(matches!(result, Err(StoreError::RuntimeUnavailable)));
    }

    #[test]
    fn test_clones_share_tables() {
        let store = lazy_store(60_000);
        let other = store.clone();

        store.insert("key".into(), "value".into());
        assert_eq!(other.get("key"), Some("value".to_string()));

        other.close();
        assert!(store.is_closed());
    }

    #[test]
    fn test_concurrent_inserts_same_key() {
        let store = lazy_store(60_000);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = store.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        s.insert("shared".into(), format!("value-{}", i));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let value = store.get("shared").unwrap();
        assert!((0..8).any(|i| value == format!("value-{}", i)));
        assert_eq!(store.physical_len(), 1);
        store.inner.assert_consistent();
    }

    #[test]
    fn test_concurrent_access_keeps_tables_paired() {
        let store = lazy_store(5);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = store.clone();
                thread::spawn(move || {
                    for j in 0..500 {
                        let key = format!("key-{}", j % 16);
                        match (i + j) % 4 {
                            0 => {
                                s.insert(key, format!("value-{}-{}", i, j));
                            }
                            1 => {
                                s.get(&key);
                            }
                            2 => {
                                s.remove(&key);
                            }
                            _ => {
                                s.purge_expired();
                            }
                        }
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        store.inner.assert_consistent();
        assert!(store.physical_len() <= 16);
    }
}
