//! Cache context declarations.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Declares how one fragment varies and how it expires.
///
/// A context is written next to every cached value (the context record) and
/// embedded in parent content as a placeholder marker, so its serialized form
/// is a wire format shared with other producers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheContext {
    /// Stable identity of the fragment.
    pub cache_id: String,
    /// Dimension names the fragment's value depends on.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dimensions: BTreeSet<String>,
    /// Invalidation labels attached at write time.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Absolute expiration relative to the write.
    #[serde(
        default,
        with = "duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
    /// Sliding expiration, reset on each read.
    #[serde(
        default,
        with = "duration_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub sliding_window: Option<Duration>,
}

impl CacheContext {
    /// Create a context with no variance, tags or expiration.
    pub fn new(cache_id: impl Into<String>) -> Self {
        Self {
            cache_id: cache_id.into(),
            dimensions: BTreeSet::new(),
            tags: BTreeSet::new(),
            duration: None,
            sliding_window: None,
        }
    }

    /// Vary the fragment by a named dimension.
    pub fn vary_by(mut self, dimension: impl Into<String>) -> Self {
        self.dimensions.insert(dimension.into());
        self
    }

    /// Attach an invalidation tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Expire the entry a fixed time after it is written.
    pub fn expires_after(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Expire the entry after a period without reads.
    pub fn expires_sliding(mut self, window: Duration) -> Self {
        self.sliding_window = Some(window);
        self
    }

    /// Whether any expiration was declared.
    pub fn has_expiration(&self) -> bool {
        self.duration.is_some() || self.sliding_window.is_some()
    }

    /// Fold a nested context into this one.
    ///
    /// Dimensions and tags are unioned; each expiration keeps the shorter of
    /// the two so the outer entry never outlives what it embeds.
    pub fn merge_from(&mut self, other: &CacheContext) {
        self.dimensions.extend(other.dimensions.iter().cloned());
        self.tags.extend(other.tags.iter().cloned());
        self.duration = shortest(self.duration, other.duration);
        self.sliding_window = shortest(self.sliding_window, other.sliding_window);
    }
}

fn shortest(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Serde adapter storing `Option<Duration>` as whole milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_duration_saturates() {
        let ctx = CacheContext::new("x").expires_after(Duration::MAX);
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["duration"], serde_json::json!(u64::MAX));
    }

    #[test]
    fn test_builder_collects_dimensions_and_tags() {
        let ctx = CacheContext::new("menu")
            .vary_by("culture")
            .vary_by("user.roles")
            .vary_by("culture")
            .with_tag("navigation");

        assert_eq!(ctx.cache_id, "menu");
        assert_eq!(ctx.dimensions.len(), 2);
        assert!(ctx.tags.contains("navigation"));
        assert!(!ctx.has_expiration());
    }

    #[test]
    fn test_json_uses_camel_case_and_millis() {
        let ctx = CacheContext::new("footer")
            .vary_by("culture")
            .expires_sliding(Duration::from_secs(90));

        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(
            json,
            r#"{"cacheId":"footer","dimensions":["culture"],"slidingWindow":90000}"#
        );
    }

    #[test]
    fn test_json_omitted_fields_default() {
        let ctx: CacheContext = serde_json::from_str(r#"{"cacheId":"bare"}"#).unwrap();
        assert_eq!(ctx, CacheContext::new("bare"));
    }

    #[test]
    fn test_merge_keeps_shortest_expiration() {
        let mut outer = CacheContext::new("page")
            .vary_by("culture")
            .expires_after(Duration::from_secs(600));
        let inner = CacheContext::new("cart")
            .vary_by("user")
            .with_tag("cart")
            .expires_after(Duration::from_secs(30))
            .expires_sliding(Duration::from_secs(10));

        outer.merge_from(&inner);

        assert!(outer.dimensions.contains("culture"));
        assert!(outer.dimensions.contains("user"));
        assert!(outer.tags.contains("cart"));
        assert_eq!(outer.duration, Some(Duration::from_secs(30)));
        assert_eq!(outer.sliding_window, Some(Duration::from_secs(10)));
        assert_eq!(outer.cache_id, "page");
    }
}
