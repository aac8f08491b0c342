//! Cache key derivation.

use anyhow::Result;
use edge_core::CacheContext;

use super::{dimension_names, memory_engine, KeyArgs, Outcome};
use crate::context::Context;

/// Run the key command.
pub async fn run(args: KeyArgs, ctx: &Context) -> Result<Outcome> {
    let engine = memory_engine(&args.dims, &ctx.config.cache)?;

    let context = dimension_names(&args.dims)
        .fold(CacheContext::new(&args.cache_id), |context, name| context.vary_by(name));
    let key = engine.key_for(&context).await?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "cacheId": args.cache_id,
            "key": key.as_str(),
            "contextKey": edge_cache::context_key(&args.cache_id),
        }));
    } else {
        ctx.output.value(key.as_str());
    }

    Ok(Outcome::Done)
}
