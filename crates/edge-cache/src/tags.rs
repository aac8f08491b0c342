//! Tagging of cache keys for bulk invalidation.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StoreError, TagError};
use crate::store::BackingStore;

/// The tagging capability the cache engine depends on.
///
/// Only writes happen through this trait; lookups and purges belong to the
/// index implementation.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Record that `key` carries every tag in `tags`.
    async fn tag(&self, key: &str, tags: &BTreeSet<String>) -> Result<(), TagError>;
}

/// In-memory index from tag to the keys carrying it.
#[derive(Debug, Default)]
pub struct MemoryTagIndex {
    keys: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryTagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently recorded for `tag`, sorted.
    pub async fn keys_for(&self, tag: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .keys
            .read()
            .await
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Forget `tag`, returning the keys it was attached to.
    pub async fn remove_tag(&self, tag: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .keys
            .write()
            .await
            .remove(tag)
            .map(|keys| keys.into_iter().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Tagger for MemoryTagIndex {
    async fn tag(&self, key: &str, tags: &BTreeSet<String>) -> Result<(), TagError> {
        let mut index = self.keys.write().await;
        for tag in tags {
            index.entry(tag.clone()).or_default().insert(key.to_string());
        }
        Ok(())
    }
}

/// A tagger bound after construction.
///
/// Lets the engine be built before the tag index that may itself depend on
/// it; tagging before [`bind`](Self::bind) fails with [`TagError::Unbound`].
#[derive(Default)]
pub struct LazyTagger {
    inner: OnceLock<Arc<dyn Tagger>>,
}

impl LazyTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the underlying tagger. Returns `false` if one was already bound.
    pub fn bind(&self, tagger: Arc<dyn Tagger>) -> bool {
        self.inner.set(tagger).is_ok()
    }

    pub fn is_bound(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl std::fmt::Debug for LazyTagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyTagger")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[async_trait]
impl Tagger for LazyTagger {
    async fn tag(&self, key: &str, tags: &BTreeSet<String>) -> Result<(), TagError> {
        match self.inner.get() {
            Some(tagger) => tagger.tag(key, tags).await,
            None => Err(TagError::Unbound),
        }
    }
}

/// Remove every entry tagged with `tag` from `store`.
///
/// Returns the number of entries that were still present.
pub async fn invalidate_tag(
    store: &dyn BackingStore,
    index: &MemoryTagIndex,
    tag: &str,
) -> Result<usize, StoreError> {
    let mut removed = 0;
    for key in index.remove_tag(tag).await {
        if store.remove(&key).await? {
            removed += 1;
        }
    }
    tracing::debug!(tag, removed, "invalidated tag");
    Ok(removed)
}
