//! # attest CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use attest_cli::config_check::{run_config_check, ConfigCheckArgs};
use attest_cli::due_date::{run_due_date, DueDateArgs};
use attest_cli::openapi::{run_openapi, OpenApiArgs};
use attest_cli::sweep::{run_sweep, SweepArgs};

/// Operator tooling for the policy acknowledgement tracker.
#[derive(Parser, Debug)]
#[command(name = "attest", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute an acknowledgement due date offline.
    DueDate(DueDateArgs),

    /// Validate a YAML configuration file.
    ConfigCheck(ConfigCheckArgs),

    /// Run one escalation sweep on a running service.
    Sweep(SweepArgs),

    /// Print the OpenAPI document.
    #[command(name = "openapi")]
    OpenApi(OpenApiArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::DueDate(args) => run_due_date(&args),
        Commands::ConfigCheck(args) => run_config_check(&args),
        Commands::Sweep(args) => run_sweep(&args),
        Commands::OpenApi(args) => run_openapi(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
