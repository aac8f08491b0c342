//! Per-request resolution of cached fragments.

use std::future::Future;

use async_recursion::async_recursion;
use edge_core::{CacheContext, ScopeGuard, ScopeTracker};

use crate::engine::DynamicCache;
use crate::error::{CacheError, CacheResult};
use crate::memo::LocalMemo;
use crate::placeholder::{self, Segment};

/// One resolution tree over a [`DynamicCache`].
///
/// A session owns the local memo and the scope tracker for a single request
/// or unit of work. It is not shared between concurrent resolutions; open a
/// new session for each.
pub struct CacheSession<'e, T> {
    engine: &'e DynamicCache,
    memo: LocalMemo,
    scope: T,
}

impl<'e, T: ScopeTracker + Send> CacheSession<'e, T> {
    pub(crate) fn new(engine: &'e DynamicCache, scope: T) -> Self {
        Self {
            engine,
            memo: LocalMemo::new(),
            scope,
        }
    }

    /// Look up a fragment by its bare id.
    ///
    /// The fragment's last declared context tells which dimensions to
    /// resolve; without it the lookup is a miss. Content embedding a missing
    /// fragment is a miss too, never returned half-substituted.
    pub async fn get(&mut self, cache_id: &str) -> CacheResult<Option<String>> {
        let Some(context) = self.engine.read_context(cache_id).await? else {
            self.engine.metrics().record_miss();
            return Ok(None);
        };
        self.get_by_context(&context).await
    }

    /// Look up a fragment using an already known context.
    pub async fn get_by_context(&mut self, context: &CacheContext) -> CacheResult<Option<String>> {
        let mut resolver = Resolver {
            engine: self.engine,
            memo: &mut self.memo,
        };
        resolver.lookup(context, 0, &mut self.scope).await
    }

    /// Store a rendered fragment.
    ///
    /// Writes the value under its concrete key and the context under the
    /// fragment's registry key, tags the value key, and remembers the value
    /// for the rest of this session.
    pub async fn set(&mut self, context: &CacheContext, value: &str) -> CacheResult<()> {
        let key = self.engine.key_for(context).await?;
        self.engine.write(context, &key, value).await?;
        self.memo.insert(key, value.to_string());
        Ok(())
    }

    /// Replace every placeholder marker in `content` with its fragment.
    ///
    /// Returns `None` if any nested fragment, at any depth, is missing; the
    /// content is never returned partly substituted.
    pub async fn resolve_placeholders(&mut self, content: String) -> CacheResult<Option<String>> {
        let mut resolver = Resolver {
            engine: self.engine,
            memo: &mut self.memo,
        };
        resolver
            .resolve_placeholders(content, 0, &mut self.scope)
            .await
    }

    /// Return the cached fragment, or render, store and return it.
    ///
    /// With single-flight enabled, concurrent sessions missing the same key
    /// wait for the first renderer and reuse what it stored.
    ///
    /// Freshly rendered content is stored as produced and returned with its
    /// markers resolved, the same as a hit. If a fragment it embeds is not
    /// cached, the content stays stored and [`CacheError::Render`] is returned.
    pub async fn get_or_render<F, Fut>(&mut self, context: &CacheContext, render: F) -> CacheResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<String>>,
    {
        if let Some(hit) = self.get_by_context(context).await? {
            return Ok(hit);
        }

        let _flight = if self.engine.settings().single_flight {
            let key = self.engine.key_for(context).await?;
            let guard = self.engine.flights.acquire(key.as_str()).await;
            if let Some(hit) = self.get_by_context(context).await? {
                tracing::debug!(key = %key, "fragment rendered by concurrent request");
                return Ok(hit);
            }
            Some(guard)
        } else {
            None
        };

        let rendered = render().await?;
        self.set(context, &rendered).await?;

        match self.resolve_placeholders(rendered).await? {
            Some(resolved) => Ok(resolved),
            None => Err(CacheError::Render(format!(
                "fragment `{}` embeds a fragment that is not cached",
                context.cache_id
            ))),
        }
    }

    /// The scope tracker of this session.
    pub fn scope(&self) -> &T {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut T {
        &mut self.scope
    }

    /// End the session, keeping its scope tracker.
    pub fn into_scope(self) -> T {
        self.scope
    }

    /// Entries remembered by this session.
    pub fn memo(&self) -> &LocalMemo {
        &self.memo
    }
}

/// Borrow of a session's engine and memo, apart from its scope tracker so
/// the tracker can be handed down the recursion through scope guards.
struct Resolver<'e, 'm> {
    engine: &'e DynamicCache,
    memo: &'m mut LocalMemo,
}

impl<'e, 'm> Resolver<'e, 'm> {
    async fn lookup<T>(
        &mut self,
        context: &CacheContext,
        depth: usize,
        scope: &mut T,
    ) -> CacheResult<Option<String>>
    where
        T: ScopeTracker + Send + ?Sized,
    {
        let metrics = self.engine.metrics();
        let key = self.engine.key_for(context).await?;

        let memoized = self.memo.get(&key).map(str::to_string);
        let raw = match memoized {
            Some(content) => {
                metrics.record_memo_hit();
                tracing::trace!(key = %key, depth, "memo hit");
                content
            }
            None => match self.engine.fetch(&key).await? {
                Some(content) => {
                    metrics.record_hit();
                    tracing::trace!(key = %key, depth, "store hit");
                    self.memo.insert(key.clone(), content.clone());
                    content
                }
                None => {
                    metrics.record_miss();
                    tracing::debug!(cache_id = %context.cache_id, key = %key, depth, "fragment miss");
                    return Ok(None);
                }
            },
        };

        self.resolve_placeholders(raw, depth, scope).await
    }

    #[async_recursion]
    async fn resolve_placeholders<T>(
        &mut self,
        content: String,
        depth: usize,
        scope: &mut T,
    ) -> CacheResult<Option<String>>
    where
        T: ScopeTracker + Send + ?Sized,
    {
        if !placeholder::contains_marker(&content) {
            return Ok(Some(content));
        }

        let mut resolved = String::with_capacity(content.len());
        for segment in placeholder::segments(&content) {
            let payload = match segment {
                Segment::Text(text) => {
                    resolved.push_str(text);
                    continue;
                }
                Segment::Marker(payload) => payload,
            };

            if depth >= self.engine.settings().max_nesting_depth {
                return Err(CacheError::NestingTooDeep { depth });
            }

            let nested = placeholder::decode(payload).inspect_err(|err| {
                tracing::warn!(depth, error = %err, "malformed placeholder");
            })?;

            let fragment = {
                let mut guard = ScopeGuard::enter(&mut *scope, &nested);
                self.lookup(&nested, depth + 1, &mut *guard).await?
            };

            match fragment {
                Some(fragment) => {
                    self.engine.metrics().record_placeholder();
                    resolved.push_str(&fragment);
                }
                None => {
                    tracing::debug!(
                        cache_id = %nested.cache_id,
                        depth,
                        "nested fragment missing, parent is a miss"
                    );
                    return Ok(None);
                }
            }
        }

        Ok(Some(resolved))
    }
}
