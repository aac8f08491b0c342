//! Configuration commands.

use anyhow::Result;

use super::{ConfigArgs, ConfigCommand, Outcome};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<Outcome> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<Outcome> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(Outcome::Done);
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "defaults"),
    }

    let cache = &ctx.config.cache;
    ctx.output.kv(
        "cache.default_sliding_window_ms",
        &cache.default_sliding_window.as_millis().to_string(),
    );
    ctx.output
        .kv("cache.max_nesting_depth", &cache.max_nesting_depth.to_string());
    ctx.output
        .kv("cache.single_flight", &cache.single_flight.to_string());
    ctx.output
        .kv("logging.level", &ctx.config.logging.level.to_string());
    ctx.output
        .kv("logging.format", &format!("{:?}", ctx.config.logging.format));

    ctx.output.debug(&ctx.config.to_toml()?);
    ctx.output.success("configuration is valid");
    Ok(Outcome::Done)
}
