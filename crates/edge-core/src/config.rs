//! Cache engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sliding window applied when a context declares no expiration.
pub const DEFAULT_SLIDING_WINDOW: Duration = Duration::from_secs(60);

/// Maximum placeholder nesting followed before resolution gives up.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// Settings for the dynamic cache engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Sliding window used when neither expiration is declared.
    #[serde(
        rename = "default_sliding_window_ms",
        default = "default_sliding_window",
        with = "millis"
    )]
    pub default_sliding_window: Duration,
    /// Deepest placeholder nesting resolved.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
    /// Coalesce concurrent renders of the same missing fragment.
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,
}

fn default_sliding_window() -> Duration {
    DEFAULT_SLIDING_WINDOW
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

fn default_single_flight() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_sliding_window: DEFAULT_SLIDING_WINDOW,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            single_flight: true,
        }
    }
}

impl CacheSettings {
    /// Override the default sliding window.
    pub fn with_default_sliding_window(mut self, window: Duration) -> Self {
        self.default_sliding_window = window;
        self
    }

    /// Override the nesting limit.
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Enable or disable render coalescing.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_window_saturates() {
        let settings = CacheSettings::default().with_default_sliding_window(Duration::MAX);
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["default_sliding_window_ms"], serde_json::json!(u64::MAX));
    }

    #[test]
    fn test_defaults() {
        let settings = CacheSettings::default();
        assert_eq!(settings.default_sliding_window, Duration::from_secs(60));
        assert_eq!(settings.max_nesting_depth, 32);
        assert!(settings.single_flight);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: CacheSettings =
            serde_json::from_str(r#"{"default_sliding_window_ms": 5000}"#).unwrap();
        assert_eq!(settings.default_sliding_window, Duration::from_secs(5));
        assert_eq!(settings.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_builders() {
        let settings = CacheSettings::default()
            .with_max_nesting_depth(4)
            .with_single_flight(false);
        assert_eq!(settings.max_nesting_depth, 4);
        assert!(!settings.single_flight);
    }
}
