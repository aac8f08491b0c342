//! Placeholder marker decoding.

use anyhow::{Context as _, Result};
use edge_cache::placeholder;

use super::{DecodeArgs, Outcome};
use crate::context::Context;

/// Run the decode command.
pub async fn run(args: DecodeArgs, ctx: &Context) -> Result<Outcome> {
    let context = placeholder::decode_marker(args.marker.trim()).context("Invalid marker")?;
    ctx.output.json(&context);
    Ok(Outcome::Done)
}
