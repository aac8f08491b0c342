//! Per-resolution memo of fetched fragment content.

use std::collections::HashMap;

use crate::key::CacheKey;

/// Raw content already fetched or written during one resolution tree.
///
/// Owned by a single session; never shared between concurrent resolutions.
#[derive(Debug, Clone, Default)]
pub struct LocalMemo {
    entries: HashMap<CacheKey, String>,
}

impl LocalMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: CacheKey, content: String) {
        self.entries.insert(key, content);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
