//! Ferry - Pluggable data-collection agent
//!
//! Moves payloads from one input, through one filter, to one output.
//!
//! # Usage
//!
//! ```bash
//! # Run the agent (default)
//! ferry
//! ferry --config configs/ferry.toml
//!
//! # Override the configured plugins
//! ferry --input file --filter noop --output logr
//!
//! # List built-in plugins
//! ferry plugins
//! ```

mod cmd;
mod logging;
mod plugins;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Ferry - Pluggable data-collection agent
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Global args that apply to serve when no subcommand given
    #[command(flatten)]
    serve: cmd::serve::ServeArgs,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the agent
    Serve,

    /// List the built-in plugins
    Plugins,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let loaded = cmd::serve::load(&cli.serve)?;
            logging::init(&loaded.config.log)?;
            cmd::serve::run(loaded).await
        }
        // Plugins doesn't need logging - just outputs to stdout
        Command::Plugins => cmd::plugins::run(),
    }
}
