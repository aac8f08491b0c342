//! Tracking of the cache context currently being resolved.

use std::ops::{Deref, DerefMut};

use crate::context::CacheContext;

/// Stack of active cache contexts during a resolution.
///
/// Implementations are owned by a single resolution tree and are not shared
/// between concurrent resolutions.
pub trait ScopeTracker {
    /// Make `context` the active scope.
    fn enter(&mut self, context: &CacheContext);

    /// Leave the active scope.
    fn exit(&mut self);
}

/// Default tracker: a stack whose frames bubble into their parent on exit.
///
/// Tags or dimensions added while a nested context is active end up on every
/// enclosing context once the nested scope is left.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<CacheContext>,
    completed: Option<CacheContext>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The innermost active context.
    pub fn current(&self) -> Option<&CacheContext> {
        self.frames.last()
    }

    /// Number of active scopes.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Attach tags to the innermost active context.
    pub fn add_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if let Some(frame) = self.frames.last_mut() {
            frame.tags.extend(tags.into_iter().map(Into::into));
        }
    }

    /// Take the outermost context that was most recently left, with
    /// everything its descendants bubbled into it.
    pub fn take_completed(&mut self) -> Option<CacheContext> {
        self.completed.take()
    }
}

impl ScopeTracker for ScopeStack {
    fn enter(&mut self, context: &CacheContext) {
        self.frames.push(context.clone());
    }

    fn exit(&mut self) {
        let Some(frame) = self.frames.pop() else {
            tracing::warn!("scope exit without matching enter");
            return;
        };
        match self.frames.last_mut() {
            Some(parent) => parent.merge_from(&frame),
            None => self.completed = Some(frame),
        }
    }
}

/// Guard holding a scope open; the scope is exited when the guard drops.
///
/// The guard dereferences to the tracker so nested resolution can keep
/// entering scopes through it.
pub struct ScopeGuard<'a, T: ScopeTracker + ?Sized> {
    tracker: &'a mut T,
}

impl<'a, T: ScopeTracker + ?Sized> ScopeGuard<'a, T> {
    /// Enter `context` on `tracker`.
    pub fn enter(tracker: &'a mut T, context: &CacheContext) -> Self {
        tracker.enter(context);
        Self { tracker }
    }
}

impl<T: ScopeTracker + ?Sized> Deref for ScopeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.tracker
    }
}

impl<T: ScopeTracker + ?Sized> DerefMut for ScopeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.tracker
    }
}

impl<T: ScopeTracker + ?Sized> Drop for ScopeGuard<'_, T> {
    fn drop(&mut self) {
        self.tracker.exit();
    }
}
