//! Dimension resolution and discriminator values.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;

/// Error returned by a [`DimensionResolver`].
#[derive(Debug, thiserror::Error)]
pub enum DimensionError {
    /// The resolver could not produce a value for a dimension.
    #[error("failed to resolve dimension `{dimension}`: {reason}")]
    Unresolvable { dimension: String, reason: String },

    /// The resolver's own backend failed.
    #[error("dimension resolver unavailable: {0}")]
    Unavailable(String),
}

/// Resolved values for a set of dimensions, keyed by dimension name.
///
/// Entries are kept ordered by dimension, so two sets holding the same pairs
/// are equal and iterate identically whatever order they were built in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Discriminators(BTreeMap<String, String>);

impl Discriminators {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value of a dimension, replacing any previous value.
    pub fn insert(&mut self, dimension: impl Into<String>, value: impl Into<String>) {
        self.0.insert(dimension.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, dimension: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(dimension, value);
        self
    }

    /// Value resolved for a dimension.
    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.0.get(dimension).map(String::as_str)
    }

    /// Iterate entries in dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(d, v)| (d.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Discriminators {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Maps dimension names to their current values for the active request.
#[async_trait]
pub trait DimensionResolver: Send + Sync {
    /// Resolve the current value of every named dimension it knows about.
    async fn resolve(&self, dimensions: &BTreeSet<String>) -> Result<Discriminators, DimensionError>;
}

/// Resolver backed by a fixed map of values.
///
/// Dimensions missing from the map produce no entry, the same way a request
/// without a matching provider contributes nothing to the key.
#[derive(Debug, Clone, Default)]
pub struct StaticDimensions {
    values: HashMap<String, String>,
}

impl StaticDimensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value reported for a dimension.
    pub fn with(mut self, dimension: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(dimension.into(), value.into());
        self
    }

    /// Parse `name=value` pairs, as accepted on the command line.
    pub fn parse_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self, DimensionError> {
        let mut resolver = Self::new();
        for pair in pairs {
            let (name, value) = pair.split_once('=').ok_or_else(|| DimensionError::Unresolvable {
                dimension: pair.to_string(),
                reason: "expected `name=value`".to_string(),
            })?;
            resolver.values.insert(name.trim().to_string(), value.to_string());
        }
        Ok(resolver)
    }
}

#[async_trait]
impl DimensionResolver for StaticDimensions {
    async fn resolve(&self, dimensions: &BTreeSet<String>) -> Result<Discriminators, DimensionError> {
        let mut resolved = Discriminators::new();
        for dimension in dimensions {
            match self.values.get(dimension) {
                Some(value) => resolved.insert(dimension.clone(), value.clone()),
                None => tracing::trace!(dimension = %dimension, "no value for dimension"),
            }
        }
        Ok(resolved)
    }
}
