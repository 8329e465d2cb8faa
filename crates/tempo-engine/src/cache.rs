//! Keyed cache with optional TTL and explicit invalidation.
//!
//! Payloads are held in serialized form. A payload that fails to serialize is
//! not stored (the write is fire-and-forget); one that fails to deserialize is
//! evicted and reported as a miss, so callers always fall back to the origin.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clock::Clock;

/// Which keys an invalidation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation<'a> {
    Key(&'a str),
    Prefix(&'a str),
    All,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    inserted_at: DateTime<Utc>,
}

/// A typed view over a string-keyed cache.
///
/// `ttl = None` means entries live until invalidated.
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Option<TimeDelta>,
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> TtlCache<T>
where
    T: Serialize + DeserializeOwned,
{
    #[must_use]
    pub fn new(ttl: Option<Duration>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: ttl.map(|d| TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)),
            clock,
            _payload: PhantomData,
        }
    }

    /// A cache whose entries never expire on their own.
    #[must_use]
    pub fn manual(clock: Arc<dyn Clock>) -> Self {
        Self::new(None, clock)
    }

    /// Fetch a live entry. Expired and undecodable entries are misses.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let payload = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            let entry = entries.get(key)?;
            if self.is_live(entry, now) {
                Some(entry.payload.clone())
            } else {
                None
            }
        };

        match payload {
            Some(payload) => match serde_json::from_value(payload) {
                Ok(value) => Some(value),
                Err(error) => {
                    tracing::warn!(key, %error, "evicting undecodable cache entry");
                    self.evict(key);
                    None
                }
            },
            None => {
                tracing::debug!(key, "cache entry expired");
                self.evict(key);
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(payload) => {
                let entry = CacheEntry {
                    payload,
                    inserted_at: self.clock.now(),
                };
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key.to_string(), entry);
            }
            Err(error) => {
                tracing::warn!(key, %error, "cache write skipped");
                // A stale value must not outlive a failed refresh.
                self.evict(key);
            }
        }
    }

    /// Drop the entries matched by `scope`. Returns how many were removed.
    pub fn invalidate(&self, scope: Invalidation<'_>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        match scope {
            Invalidation::Key(key) => {
                entries.remove(key);
            }
            Invalidation::Prefix(prefix) => entries.retain(|k, _| !k.starts_with(prefix)),
            Invalidation::All => entries.clear(),
        }
        before - entries.len()
    }

    /// Number of stored entries, live or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_live(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        self.ttl.is_none_or(|ttl| now - entry.inserted_at < ttl)
    }

    fn evict(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
