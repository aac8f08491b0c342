//! The dynamic cache engine.

use std::sync::Arc;

use edge_core::{
    CacheContext, CacheSettings, DimensionResolver, Discriminators, ScopeStack, ScopeTracker,
};
use edge_observability::CacheMetrics;

use crate::error::{CacheError, CacheResult};
use crate::flight::SingleFlight;
use crate::key::{context_key, CacheKey};
use crate::session::CacheSession;
use crate::store::{BackingStore, EntryOptions};
use crate::tags::Tagger;

/// Stores rendered fragments under keys derived from their declared
/// dimensions, and stitches nested fragments back into their parents.
///
/// The engine is shared; per-request state (local memo, active scopes) lives
/// in a [`CacheSession`].
///
/// # Example
///
/// ```ignore
/// let cache = DynamicCache::new(store, resolver, tags);
/// let mut session = cache.session();
///
/// let menu = CacheContext::new("menu").vary_by("culture");
/// session.set(&menu, "<nav>...</nav>").await?;
/// let html = session.get("menu").await?;
/// ```
pub struct DynamicCache {
    store: Arc<dyn BackingStore>,
    dimensions: Arc<dyn DimensionResolver>,
    tagger: Arc<dyn Tagger>,
    settings: CacheSettings,
    metrics: Arc<CacheMetrics>,
    pub(crate) flights: SingleFlight,
}

impl DynamicCache {
    /// Create an engine over its collaborators, with default settings.
    pub fn new(
        store: Arc<dyn BackingStore>,
        dimensions: Arc<dyn DimensionResolver>,
        tagger: Arc<dyn Tagger>,
    ) -> Self {
        Self {
            store,
            dimensions,
            tagger,
            settings: CacheSettings::default(),
            metrics: Arc::new(CacheMetrics::new()),
            flights: SingleFlight::new(),
        }
    }

    /// Replace the engine settings.
    pub fn with_settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Report into a shared metrics instance.
    pub fn with_metrics(mut self, metrics: Arc<CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }

    /// Start a resolution tree with the default scope tracker.
    pub fn session(&self) -> CacheSession<'_, ScopeStack> {
        CacheSession::new(self, ScopeStack::new())
    }

    /// Start a resolution tree with a caller-provided scope tracker.
    pub fn session_with<T: ScopeTracker + Send>(&self, tracker: T) -> CacheSession<'_, T> {
        CacheSession::new(self, tracker)
    }

    /// Look up a fragment by id in a fresh session.
    pub async fn get(&self, cache_id: &str) -> CacheResult<Option<String>> {
        self.session().get(cache_id).await
    }

    /// Store a fragment in a fresh session.
    pub async fn set(&self, context: &CacheContext, value: &str) -> CacheResult<()> {
        self.session().set(context, value).await
    }

    /// Concrete key of `context` for the current dimension values.
    pub async fn key_for(&self, context: &CacheContext) -> CacheResult<CacheKey> {
        if context.dimensions.is_empty() {
            return Ok(CacheKey::build(&context.cache_id, &Discriminators::new()));
        }
        let discriminators = self.dimensions.resolve(&context.dimensions).await?;
        Ok(CacheKey::build(&context.cache_id, &discriminators))
    }

    /// Read the last declared context of `cache_id`.
    ///
    /// A record that is absent or unreadable is a miss; the next `set`
    /// overwrites it.
    pub(crate) async fn read_context(&self, cache_id: &str) -> CacheResult<Option<CacheContext>> {
        let key = context_key(cache_id);
        let Some(bytes) = self.store.get(&key).await? else {
            tracing::debug!(cache_id, "no context record");
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(context) => Ok(Some(context)),
            Err(err) => {
                tracing::warn!(cache_id, error = %err, "unreadable context record");
                Ok(None)
            }
        }
    }

    /// Fetch raw fragment content from the store.
    pub(crate) async fn fetch(&self, key: &CacheKey) -> CacheResult<Option<String>> {
        let Some(bytes) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };

        match String::from_utf8(bytes) {
            Ok(content) => Ok(Some(content)),
            Err(_) => {
                tracing::warn!(key = %key, "stored fragment is not valid UTF-8");
                Ok(None)
            }
        }
    }

    /// Write a fragment value, its context record and its tags.
    ///
    /// Both store writes share one expiration and run concurrently. Both are
    /// driven to completion; the value write's failure is reported first and
    /// neither write is rolled back.
    pub(crate) async fn write(
        &self,
        context: &CacheContext,
        key: &CacheKey,
        value: &str,
    ) -> CacheResult<()> {
        let options = EntryOptions::for_context(context, &self.settings);
        let record = serde_json::to_vec(context)?;
        let record_key = context_key(&context.cache_id);

        let value_write = async {
            self.store
                .set(key.as_str(), value.as_bytes().to_vec(), options)
                .await
                .map_err(|source| CacheError::Write {
                    key: key.to_string(),
                    source,
                })
        };
        let record_write = async {
            self.store
                .set(&record_key, record, options)
                .await
                .map_err(|source| CacheError::Write {
                    key: record_key.clone(),
                    source,
                })
        };

        let (value_written, record_written) = futures::join!(value_write, record_write);
        if let Err(err) = value_written.and(record_written) {
            self.metrics.record_write_failure();
            tracing::warn!(cache_id = %context.cache_id, error = %err, "cache write failed");
            return Err(err);
        }

        if !context.tags.is_empty() {
            if let Err(source) = self.tagger.tag(key.as_str(), &context.tags).await {
                self.metrics.record_write_failure();
                return Err(CacheError::Tag {
                    key: key.to_string(),
                    source,
                });
            }
        }

        self.metrics.record_write();
        tracing::debug!(cache_id = %context.cache_id, key = %key, "fragment stored");
        Ok(())
    }
}

impl std::fmt::Debug for DynamicCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicCache")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
