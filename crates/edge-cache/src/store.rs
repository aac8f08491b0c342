//! Backing store seam and an in-memory implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use edge_core::{CacheContext, CacheSettings};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::StoreError;

/// Expiration applied to a stored entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Expire after this long without a read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sliding_expiration: Option<Duration>,
    /// Expire this long after the write, regardless of reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_expiration_relative_to_now: Option<Duration>,
}

impl EntryOptions {
    /// Expiration for entries written on behalf of `context`.
    ///
    /// A context declaring neither expiration gets the configured default
    /// sliding window, so no entry is ever written without one.
    pub fn for_context(context: &CacheContext, settings: &CacheSettings) -> Self {
        if !context.has_expiration() {
            return Self::sliding(settings.default_sliding_window);
        }
        Self {
            sliding_expiration: context.sliding_window,
            absolute_expiration_relative_to_now: context.duration,
        }
    }

    /// Sliding expiration only.
    pub fn sliding(window: Duration) -> Self {
        Self {
            sliding_expiration: Some(window),
            absolute_expiration_relative_to_now: None,
        }
    }

    /// Absolute expiration only.
    pub fn absolute(ttl: Duration) -> Self {
        Self {
            sliding_expiration: None,
            absolute_expiration_relative_to_now: Some(ttl),
        }
    }
}

/// Byte-oriented key/value store holding cached fragments.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Fetch the bytes stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: Vec<u8>, options: EntryOptions) -> Result<(), StoreError>;

    /// Drop the entry under `key`. Returns whether one existed.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    data: Vec<u8>,
    deadline: Option<Instant>,
    sliding: Option<Duration>,
    last_accessed: Instant,
}

impl StoredEntry {
    fn new(data: Vec<u8>, options: EntryOptions) -> Self {
        let now = Instant::now();
        Self {
            data,
            deadline: options.absolute_expiration_relative_to_now.map(|ttl| now + ttl),
            sliding: options.sliding_expiration,
            last_accessed: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            return true;
        }
        self.sliding
            .is_some_and(|window| now.duration_since(self.last_accessed) >= window)
    }
}

/// In-memory backing store for development and tests.
///
/// Honours both expirations: an entry disappears at its absolute deadline or
/// once its sliding window elapses without a read, whichever comes first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.get_mut(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => {
                entry.last_accessed = now;
                Ok(Some(entry.data.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, options: EntryOptions) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), StoredEntry::new(value, options));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
