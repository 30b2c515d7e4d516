//! bundler-upgraded-yet - HTTP entry point
//!
//! Serves by default; `check` evaluates once and prints the answer.

use bundler_upgraded_yet::cli::{self, Cli, Commands};
use bundler_upgraded_yet::error::AppResult;
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();
    let config = cli::load_config(&cli).await?;

    init_logging(cli.verbose, &config.general.log_format);
    match cli.config {
        Some(ref path) => debug!("Loaded configuration from {}", path.display()),
        None => debug!("No config file given, using defaults"),
    }

    match cli.command {
        None | Some(Commands::Serve) => cli::commands::serve(&config).await,
        Some(Commands::Check(args)) => cli::commands::check(args, &config).await,
    }
}

/// RUST_LOG wins; otherwise 0 = info, 1 = debug, 2+ = trace
fn init_logging(verbose: u8, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("bundler_upgraded_yet=info"),
        1 => EnvFilter::new("bundler_upgraded_yet=debug"),
        _ => EnvFilter::new("bundler_upgraded_yet=trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
