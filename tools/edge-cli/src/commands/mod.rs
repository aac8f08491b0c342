//! CLI command implementations.

pub mod config;
pub mod decode;
pub mod encode;
pub mod key;
pub mod resolve;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use edge_cache::{DynamicCache, MemoryStore, MemoryTagIndex};
use edge_core::{CacheSettings, StaticDimensions};

/// How a command finished, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The requested fragment was not cached.
    Miss,
}

/// Arguments for the key command.
#[derive(Args)]
pub struct KeyArgs {
    /// Fragment id.
    pub cache_id: String,

    /// Dimension value as `name=value`; the fragment varies by every name given.
    #[arg(short, long = "dim")]
    pub dims: Vec<String>,
}

/// Arguments for the encode command.
#[derive(Args)]
pub struct EncodeArgs {
    /// Fragment id.
    pub cache_id: String,

    /// Dimension the fragment varies by.
    #[arg(long)]
    pub vary: Vec<String>,

    /// Tag attached to the fragment.
    #[arg(short, long)]
    pub tag: Vec<String>,

    /// Absolute expiration, in seconds from the write.
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Sliding expiration, in seconds.
    #[arg(long)]
    pub sliding_secs: Option<u64>,
}

/// Arguments for the decode command.
#[derive(Args)]
pub struct DecodeArgs {
    /// A full `[[cache esi='...']]` marker or its JSON payload.
    pub marker: String,
}

/// Arguments for the resolve command.
#[derive(Args)]
pub struct ResolveArgs {
    /// JSON file of writes: `[{"context": {...}, "value": "..."}]`.
    #[arg(short, long)]
    pub fixture: String,

    /// Fragment id to resolve.
    pub cache_id: String,

    /// Dimension value as `name=value`.
    #[arg(short, long = "dim")]
    pub dims: Vec<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
}

/// Build an engine over in-memory collaborators reporting `dims`.
pub(crate) fn memory_engine(dims: &[String], settings: &CacheSettings) -> Result<DynamicCache> {
    let dimensions = StaticDimensions::parse_pairs(dims.iter().map(String::as_str))
        .context("Invalid --dim value")?;

    Ok(DynamicCache::new(
        Arc::new(MemoryStore::new()),
        Arc::new(dimensions),
        Arc::new(MemoryTagIndex::new()),
    )
    .with_settings(settings.clone()))
}

/// Names of `name=value` pairs, skipping anything malformed.
pub(crate) fn dimension_names(dims: &[String]) -> impl Iterator<Item = &str> {
    dims.iter()
        .filter_map(|pair| pair.split_once('=').map(|(name, _)| name.trim()))
}
