//! Weave — recursive template composition CLI.
//!
//! # Usage
//!
//! ```text
//! weave render <site> [--theme <name>] [--runtime <file>] [--out <file>] [--max-iterations <n>]
//! weave tokens <file> [--exclude <kind|name>]... [--json]
//! weave views <site> [--json]
//! ```
//!
//! Logging goes to stderr; `-v` raises the default level to `debug` and
//! `RUST_LOG` overrides both.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{render::RenderArgs, tokens::TokensArgs, views::ViewsArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "weave",
    version,
    about = "Compose documents from themes, pages, templates and wraps",
    long_about = None,
)]
struct Cli {
    /// Log render progress at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a site's theme into a finished document.
    Render(RenderArgs),

    /// List the include tags found in a file.
    Tokens(TokensArgs),

    /// List every view a site can resolve.
    Views(ViewsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Render(args) => args.run(),
        Commands::Tokens(args) => args.run(),
        Commands::Views(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
