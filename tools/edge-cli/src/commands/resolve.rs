//! Fragment resolution against a fixture of writes.

use anyhow::{Context as _, Result};
use edge_cache::DynamicCache;
use edge_core::CacheContext;
use serde::Deserialize;

use super::{memory_engine, Outcome, ResolveArgs};
use crate::context::Context;

/// One recorded `set` call.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureEntry {
    pub context: CacheContext,
    pub value: String,
}

/// Run the resolve command.
pub async fn run(args: ResolveArgs, ctx: &Context) -> Result<Outcome> {
    let path = ctx.resolve_path(&args.fixture);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
    let entries: Vec<FixtureEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fixture: {}", path.display()))?;

    let engine = memory_engine(&args.dims, &ctx.config.cache)?;
    replay(&engine, &entries).await?;
    ctx.output
        .debug(&format!("replayed {} writes from {}", entries.len(), path.display()));

    let resolved = engine.get(&args.cache_id).await?;
    let metrics = engine.metrics().snapshot();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "cacheId": args.cache_id,
            "hit": resolved.is_some(),
            "value": resolved,
            "metrics": metrics,
        }));
    } else {
        match &resolved {
            Some(value) => ctx.output.value(value),
            None => ctx.output.warn(&format!("miss: {}", args.cache_id)),
        }
        ctx.output.debug(&format!(
            "hits={} misses={} placeholders={}",
            metrics.hits, metrics.misses, metrics.placeholders_resolved
        ));
    }

    Ok(match resolved {
        Some(_) => Outcome::Done,
        None => Outcome::Miss,
    })
}

/// Apply every fixture write, in order, within one session.
pub async fn replay(engine: &DynamicCache, entries: &[FixtureEntry]) -> Result<()> {
    let mut session = engine.session();
    for entry in entries {
        session
            .set(&entry.context, &entry.value)
            .await
            .with_context(|| format!("Failed to store fragment: {}", entry.context.cache_id))?;
    }
    Ok(())
}
