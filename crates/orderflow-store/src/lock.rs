//! Shared key/value lock store with expiry.
//!
//! The only primitive the idempotency guard needs is an atomic
//! set-if-absent with a time-to-live. Any backend offering it (an external
//! cache, a database row with an expiry column, or the in-memory map below)
//! satisfies [`LockStore`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orderflow_types::{OrderflowError, Result};
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};

/// Key/value store offering atomic check-and-set with expiry.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Store `value` under `key` for `ttl` if and only if no unexpired entry
    /// exists. Returns `true` when this call created the entry.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Remove `key`. Returns `true` if an unexpired entry was removed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Entry count at which `set_if_absent` first sweeps expired entries.
const MIN_SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
struct LockEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
struct LockTable {
    entries: HashMap<String, LockEntry>,
    /// Sweep expired entries once the map reaches this size.
    sweep_at: usize,
}

impl LockTable {
    fn purge(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP_THRESHOLD);
        before - self.entries.len()
    }
}

/// In-process [`LockStore`]. Check and set happen under one mutex.
///
/// Every key is expected to be fresh, so expired entries are swept on
/// insert whenever the map has doubled since the last sweep. The map stays
/// within twice the number of live locks (or the minimum threshold).
pub struct MemoryLockStore {
    table: Mutex<LockTable>,
    clock: Arc<dyn Clock>,
}

impl MemoryLockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: Mutex::new(LockTable {
                entries: HashMap::new(),
                sweep_at: MIN_SWEEP_THRESHOLD,
            }),
            clock,
        }
    }

    /// Value currently held under `key`, ignoring expired entries.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        self.table
            .lock()
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    /// Drop every expired entry now. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.table.lock().purge(now)
    }

    /// Number of entries held, expired ones included until swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.lock().entries.is_empty()
    }
}

impl Default for MemoryLockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| OrderflowError::LockStoreUnavailable {
            reason: format!("ttl out of range: {e}"),
        })?;
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| OrderflowError::LockStoreUnavailable {
                reason: "ttl overflows the clock".to_string(),
            })?;

        let mut table = self.table.lock();
        if table.entries.get(key).is_some_and(|entry| entry.expires_at > now) {
            return Ok(false);
        }
        if table.entries.len() >= table.sweep_at {
            let swept = table.purge(now);
            tracing::debug!(swept, live = table.entries.len(), "Swept expired lock entries");
        }
        table.entries.insert(
            key.to_string(),
            LockEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        let removed = self.table.lock().entries.remove(key);
        Ok(removed.is_some_and(|entry| entry.expires_at > now))
    }
}
