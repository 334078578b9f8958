//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

/// Environment variable holding a tracing filter, e.g. `irctls_trust=debug`.
pub const LOG_ENV: &str = "IRCTLS_LOG";

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let ctx = commands::Context {
        config_path: cli.config,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Check(args) => commands::check::execute(&ctx, args),
        Commands::Inspect(args) => commands::inspect::execute(&ctx, args),
        Commands::Store(args) => commands::store::execute(&ctx, &args),
        Commands::Config(args) => commands::config::execute(&ctx, args),
    }
}
