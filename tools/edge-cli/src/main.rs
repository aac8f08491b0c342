//! Edge cache CLI - Inspect keys, markers and fragment resolution.
//!
//! Commands:
//! - `edge-cache key` - Print the concrete key of a fragment
//! - `edge-cache encode` - Build a placeholder marker
//! - `edge-cache decode` - Decode a placeholder marker
//! - `edge-cache resolve` - Resolve a fragment from a fixture of writes
//! - `edge-cache config` - Show configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use edge_observability::LogLevel;

use commands::{ConfigArgs, DecodeArgs, EncodeArgs, KeyArgs, ResolveArgs};

/// Exit code reported when a resolved fragment is a miss.
pub const EXIT_MISS: i32 = 2;

/// Edge cache CLI - Work with cached fragments and placeholder markers
#[derive(Parser)]
#[command(name = "edge-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the concrete cache key of a fragment
    Key(KeyArgs),

    /// Encode a fragment context as a placeholder marker
    Encode(EncodeArgs),

    /// Decode a placeholder marker or payload
    Decode(DecodeArgs),

    /// Replay a fixture of writes and resolve a fragment
    Resolve(ResolveArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let mut logging = ctx.config.logging.clone();
    if cli.verbose {
        logging.level = LogLevel::Debug;
    }
    if let Err(e) = edge_observability::init(&logging) {
        ctx.output.warn(&e.to_string());
    }

    let result = match cli.command {
        Commands::Key(args) => commands::key::run(args, &ctx).await,
        Commands::Encode(args) => commands::encode::run(args, &ctx).await,
        Commands::Decode(args) => commands::decode::run(args, &ctx).await,
        Commands::Resolve(args) => commands::resolve::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    match result {
        Ok(commands::Outcome::Done) => Ok(()),
        Ok(commands::Outcome::Miss) => std::process::exit(EXIT_MISS),
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
