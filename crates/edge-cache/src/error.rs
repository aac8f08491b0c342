//! Cache error types.

use edge_core::DimensionError;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Failure reported by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the operation.
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Failure reported by a tag index.
#[derive(Debug, Error)]
pub enum TagError {
    /// A deferred tag index was used before being bound.
    #[error("tag index not bound")]
    Unbound,

    /// The index failed to record the tags.
    #[error("tag index failed: {0}")]
    Index(String),
}

/// Errors raised by the dynamic cache.
///
/// A cache miss is never an error; lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A stored placeholder marker does not hold a valid context.
    #[error("malformed cache placeholder `{payload}`: {reason}")]
    MalformedPlaceholder { payload: String, reason: String },

    /// Discriminator values could not be resolved.
    #[error(transparent)]
    Dimension(#[from] DimensionError),

    /// Reading from the backing store failed.
    #[error("cache read failed: {0}")]
    Store(#[from] StoreError),

    /// One of the writes of a `set` failed.
    #[error("cache write failed for `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Registering tags for a key failed.
    #[error("tagging failed for `{key}`: {source}")]
    Tag {
        key: String,
        #[source]
        source: TagError,
    },

    /// A context record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Placeholders nest deeper than the configured limit.
    #[error("placeholder nesting exceeds depth {depth}")]
    NestingTooDeep { depth: usize },

    /// A render callback failed.
    #[error("render failed: {0}")]
    Render(String),
}

impl CacheError {
    /// Whether re-rendering the fragment could fix this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Write { .. } | Self::Tag { .. } | Self::Dimension(_) | Self::Render(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_placeholder_is_not_retryable() {
        let err = CacheError::MalformedPlaceholder {
            payload: "{".to_string(),
            reason: "EOF".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("malformed cache placeholder"));
    }

    #[test]
    fn test_write_error_keeps_key() {
        let err = CacheError::Write {
            key: "menu/abc".to_string(),
            source: StoreError::Unavailable("timeout".to_string()),
        };
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "cache write failed for `menu/abc`: store unavailable: timeout"
        );
    }
}
