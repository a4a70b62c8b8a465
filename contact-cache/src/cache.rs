//! TTL-bounded presence cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use contact_core::error::{ContactError, Result};
use contact_core::traits::PresenceStore;

use crate::config::CacheConfig;
use crate::{eviction, reaper};

/// Last time a key was added, plus its insertion order.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Entry {
    pub(crate) seen_at: Instant,
    pub(crate) seq: u64,
}

struct Store {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// State shared between the cache handle and its reaper.
pub(crate) struct Shared {
    store: RwLock<Store>,
    config: CacheConfig,
    evictions: AtomicU64,
    reaped: AtomicU64,
    sweeps: AtomicU64,
}

impl Shared {
    fn is_fresh(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.seen_at) < self.config.ttl
    }

    /// Inserts or refreshes `key`, evicting the oldest entry if the cache is full.
    fn insert(&self, store: &mut Store, key: &str) {
        if eviction::needs_eviction(&store.entries, key, self.config.max_entries) {
            if let Some(oldest) = eviction::oldest_key(&store.entries) {
                store.entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(
                    size = store.entries.len(),
                    max_entries = self.config.max_entries,
                    "Cache full, evicted oldest entry"
                );
            }
        }

        let seq = store.next_seq;
        store.next_seq += 1;
        store.entries.insert(
            key.to_string(),
            Entry {
                seen_at: Instant::now(),
                seq,
            },
        );
    }

    /// Runs one reap pass under the write lock.
    pub(crate) fn sweep(&self) -> usize {
        let mut store = self.store.write();
        let removed = reaper::sweep(&mut store.entries, Instant::now(), self.config.ttl);
        drop(store);

        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.reaped.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }
}

/// In-memory presence cache for recently seen keys.
///
/// Answers "have I seen this key within the TTL?" and bounds memory by both
/// age and entry count. A background reaper removes expired entries every
/// reap interval, so callers never drive expiration themselves.
///
/// # Thread Safety
///
/// All operations take `&self`. Reads share a read lock; `add` and sweeps
/// take the write lock. No lock is held across an await or sleep.
///
/// # Lifecycle
///
/// Construction validates the configuration and starts the reaper on the
/// current Tokio runtime. [`destroy`](Self::destroy) (or dropping the cache)
/// stops the reaper; the cache stays usable but no longer cleans itself.
pub struct PresenceCache {
    shared: Arc<Shared>,
    shutdown: watch::Sender<bool>,
    reaper: JoinHandle<()>,
}

impl PresenceCache {
    /// Creates an unbounded cache.
    ///
    /// Fails with `InvalidTtl` if `ttl` is zero and `InvalidReapInterval` if
    /// `reap_interval` is zero or longer than `ttl`.
    ///
    /// Must be called from within a Tokio runtime, which hosts the reaper;
    /// otherwise fails with `MissingRuntime`.
    pub fn new(ttl: Duration, reap_interval: Duration) -> Result<Self> {
        Self::with_config(CacheConfig::new(ttl, reap_interval))
    }

    /// Creates a cache holding at most `max_entries` keys (0 = unbounded).
    ///
    /// Same validation and runtime requirement as [`new`](Self::new).
    pub fn with_max_entries(
        ttl: Duration,
        reap_interval: Duration,
        max_entries: usize,
    ) -> Result<Self> {
        Self::with_config(CacheConfig::new(ttl, reap_interval).with_max_entries(max_entries))
    }

    /// Creates a cache with custom configuration.
    ///
    /// Must be called from within a Tokio runtime, which hosts the reaper;
    /// otherwise fails with `MissingRuntime`.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|_| ContactError::MissingRuntime)?;

        let capacity = if config.is_bounded() { config.max_entries } else { 0 };
        let shared = Arc::new(Shared {
            store: RwLock::new(Store {
                entries: HashMap::with_capacity(capacity),
                next_seq: 0,
            }),
            config,
            evictions: AtomicU64::new(0),
            reaped: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
        });

        let (shutdown, shutdown_rx) = watch::channel(false);
        let reaper = reaper::spawn(
            &handle,
            Arc::downgrade(&shared),
            shared.config.reap_interval,
            shutdown_rx,
        );

        Ok(Self {
            shared,
            shutdown,
            reaper,
        })
    }

    /// Returns true if `key` was added less than one TTL ago.
    pub fn exists(&self, key: &str) -> bool {
        let store = self.shared.store.read();
        let now = Instant::now();
        store
            .entries
            .get(key)
            .is_some_and(|e| self.shared.is_fresh(e, now))
    }

    /// Records `key` with the current time.
    ///
    /// A new key arriving at a full cache first evicts the entry with the
    /// oldest timestamp. Refreshing a present key never evicts.
    pub fn add(&self, key: &str) {
        let mut store = self.shared.store.write();
        self.shared.insert(&mut store, key);
    }

    /// Records `key` unless it is present and fresh, under a single lock.
    ///
    /// Returns false, leaving the existing timestamp untouched, when the key
    /// was seen within the TTL.
    pub fn try_add(&self, key: &str) -> bool {
        let mut store = self.shared.store.write();
        let now = Instant::now();
        if store
            .entries
            .get(key)
            .is_some_and(|e| self.shared.is_fresh(e, now))
        {
            return false;
        }
        self.shared.insert(&mut store, key);
        true
    }

    /// Returns the number of stored entries, including expired ones not yet reaped.
    pub fn len(&self) -> usize {
        self.shared.store.read().entries.len()
    }

    /// Alias for [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.shared.store.read().entries.is_empty()
    }

    /// Removes all expired entries now, returning how many were removed.
    pub fn reap_expired(&self) -> usize {
        self.shared.sweep()
    }

    /// Stops the reaper.
    ///
    /// Idempotent and non-blocking. Existing entries stay, and `add`/`exists`
    /// keep working.
    pub fn destroy(&self) {
        if !self.shutdown.send_replace(true) {
            debug!("Reaper shutdown requested");
        }
    }

    /// Returns true once [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Returns true while the reaper task is alive.
    pub fn reaper_running(&self) -> bool {
        !self.reaper.is_finished()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let store = self.shared.store.read();
        let now = Instant::now();
        let expired = store
            .entries
            .values()
            .filter(|e| !self.shared.is_fresh(e, now))
            .count();

        CacheStats {
            total_entries: store.entries.len(),
            expired_entries: expired,
            valid_entries: store.entries.len().saturating_sub(expired),
            capacity: self.shared.config.max_entries,
            evictions: self.shared.evictions.load(Ordering::Relaxed),
            reaped: self.shared.reaped.load(Ordering::Relaxed),
            sweeps: self.shared.sweeps.load(Ordering::Relaxed),
        }
    }
}

impl Drop for PresenceCache {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

impl fmt::Debug for PresenceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceCache")
            .field("config", &self.shared.config)
            .field("len", &self.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl PresenceStore for PresenceCache {
    fn exists(&self, key: &str) -> bool {
        PresenceCache::exists(self, key)
    }

    fn add(&self, key: &str) {
        PresenceCache::add(self, key)
    }

    fn try_add(&self, key: &str) -> bool {
        PresenceCache::try_add(self, key)
    }

    fn len(&self) -> usize {
        PresenceCache::len(self)
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub valid_entries: usize,
    pub capacity: usize,
    /// Entries removed to respect `max_entries`
    pub evictions: u64,
    /// Entries removed by sweeps
    pub reaped: u64,
    /// Completed sweeps, background and manual
    pub sweeps: u64,
}
