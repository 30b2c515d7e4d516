//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Has the Heroku Ruby buildpack upgraded Bundler yet?
///
/// Serves a yes/no answer over HTTP, as HTML or JSON.
#[derive(Parser, Debug)]
#[command(name = "bundler-upgraded-yet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to serve)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BUNDLER_UPGRADED_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Settings that override the configuration file
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Minimum Bundler version the buildpack must ship
    #[arg(long, global = true, env = "MIN_BUNDLER_VERSION")]
    pub min_bundler_version: Option<String>,

    /// Redis URL used for caching (caching disabled when unset)
    #[arg(long, global = true, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Log format: text or json
    #[arg(long, global = true, env = "LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Address to bind
    #[arg(long, global = true, env = "BIND")]
    pub bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, global = true, env = "PORT")]
    pub port: Option<u16>,

    /// HTML page template
    #[arg(long, global = true, env = "INDEX_HTML")]
    pub template: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve,

    /// Evaluate once and print the answer
    Check(CheckArgs),
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the full evaluation as JSON
    #[arg(long)]
    pub json: bool,
}
