//! Placeholder marker encoding.

use std::time::Duration;

use anyhow::Result;
use edge_cache::placeholder;
use edge_core::CacheContext;

use super::{EncodeArgs, Outcome};
use crate::context::Context;

/// Run the encode command.
pub async fn run(args: EncodeArgs, ctx: &Context) -> Result<Outcome> {
    let context = build_context(&args);
    let marker = placeholder::encode(&context)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "marker": marker }));
    } else {
        ctx.output.value(&marker);
    }

    Ok(Outcome::Done)
}

fn build_context(args: &EncodeArgs) -> CacheContext {
    let mut context = args
        .vary
        .iter()
        .fold(CacheContext::new(&args.cache_id), |c, dim| c.vary_by(dim));
    context = args.tag.iter().fold(context, |c, tag| c.with_tag(tag));

    if let Some(secs) = args.duration_secs {
        context = context.expires_after(Duration::from_secs(secs));
    }
    if let Some(secs) = args.sliding_secs {
        context = context.expires_sliding(Duration::from_secs(secs));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cache_id: &str) -> EncodeArgs {
        EncodeArgs {
            cache_id: cache_id.to_string(),
            vary: Vec::new(),
            tag: Vec::new(),
            duration_secs: None,
            sliding_secs: None,
        }
    }

    #[test]
    fn test_encode_minimal_marker() {
        let mut args = args("menu");
        args.vary.push("culture".to_string());

        let marker = placeholder::encode(&build_context(&args)).unwrap();
        assert_eq!(
            marker,
            r#"[[cache esi='{"cacheId":"menu","dimensions":["culture"]}']]"#
        );
    }

    #[test]
    fn test_build_context_carries_everything() {
        let mut args = args("cart");
        args.tag.push("checkout".to_string());
        args.duration_secs = Some(300);
        args.sliding_secs = Some(30);

        let context = build_context(&args);
        assert!(context.tags.contains("checkout"));
        assert_eq!(context.duration, Some(Duration::from_secs(300)));
        assert_eq!(context.sliding_window, Some(Duration::from_secs(30)));
    }
}
