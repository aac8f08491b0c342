//! Cache key composition.

use std::fmt::Write as _;

use edge_core::Discriminators;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Prefix of the store key holding a fragment's context record.
pub const CONTEXT_KEY_PREFIX: &str = "cachecontext-";

/// Number of digest bytes kept in a value key.
const HASH_BYTES: usize = 16;

/// A concrete key under which a fragment value is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `cache_id` under the given discriminator values.
    ///
    /// Fragments with no discriminators are keyed by their id alone. Otherwise
    /// the id is suffixed with a SHA-256 prefix of the canonical entry list,
    /// which depends only on the set of pairs and never on process state.
    pub fn build(cache_id: &str, discriminators: &Discriminators) -> Self {
        if discriminators.is_empty() {
            return Self(cache_id.to_string());
        }
        Self(format!("{}/{}", cache_id, discriminator_hash(discriminators)))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Store key of the context record for `cache_id`.
pub fn context_key(cache_id: &str) -> String {
    format!("{}{}", CONTEXT_KEY_PREFIX, cache_id)
}

// Entries are length-prefixed (`len:dimension=len:value;`) so no value can
// forge a boundary between pairs.
fn discriminator_hash(discriminators: &Discriminators) -> String {
    let mut canonical = String::new();
    for (dimension, value) in discriminators.iter() {
        let _ = write!(
            canonical,
            "{}:{}={}:{};",
            dimension.len(),
            dimension,
            value.len(),
            value
        );
    }

    let digest = Sha256::digest(canonical.as_bytes());
    digest[..HASH_BYTES]
        .iter()
        .fold(String::with_capacity(HASH_BYTES * 2), |mut hex, b| {
            let _ = write!(hex, "{:02x}", b);
            hex
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_discriminators_keep_bare_id() {
        let key = CacheKey::build("footer", &Discriminators::new());
        assert_eq!(key.as_str(), "footer");
    }

    #[test]
    fn test_key_is_stable_across_processes() {
        let key = CacheKey::build("menu", &Discriminators::new().with("culture", "en"));
        assert_eq!(key.as_str(), "menu/64d34a628489b85d6ed796b5967ef77e");
    }

    #[test]
    fn test_key_ignores_entry_order() {
        let a = Discriminators::new().with("culture", "en").with("role", "admin");
        let b = Discriminators::new().with("role", "admin").with("culture", "en");

        let key = CacheKey::build("menu", &a);
        assert_eq!(key, CacheKey::build("menu", &b));
        assert_eq!(key.as_str(), "menu/69b4716fc15d5ede6808e46562387b8d");
    }

    #[test]
    fn test_different_values_do_not_collide() {
        let en = CacheKey::build("menu", &Discriminators::new().with("culture", "en"));
        let fr = CacheKey::build("menu", &Discriminators::new().with("culture", "fr"));
        assert_ne!(en, fr);
    }

    #[test]
    fn test_value_cannot_forge_entry_boundary() {
        let one = Discriminators::new().with("a", "1;b=2");
        let two = Discriminators::new().with("a", "1").with("b", "2");
        assert_ne!(CacheKey::build("x", &one), CacheKey::build("x", &two));
    }

    #[test]
    fn test_context_key_format() {
        assert_eq!(context_key("menu"), "cachecontext-menu");
    }
}
