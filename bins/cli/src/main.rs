//! invoicegen CLI
//!
//! Reads invoice rows, raises each row's value so that its sales tax is a
//! whole number, and writes the rows back out.

mod commands;
mod rows;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use invoicegen_shared::{AppConfig, AppError};

use commands::{AdjustArgs, run_adjust, run_policy};

/// Integral-tax value adjustment for sale invoice rows.
#[derive(Parser, Debug)]
#[command(name = "invoicegen", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Extra configuration file layered over `config/default`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Adjust a batch of rows.
    Adjust(AdjustArgs),

    /// Print the effective adjustment policy as JSON.
    Policy,
}

/// Log filter for a `-v` count. `RUST_LOG` wins when set.
fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    })
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).map_err(AppError::from)?;
    tracing::debug!(?config, "Loaded configuration");

    match &cli.command {
        Commands::Adjust(args) => run_adjust(args, &config),
        Commands::Policy => run_policy(&config),
    }
}

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr; stdout carries rows.
    tracing_subscriber::registry()
        .with(log_filter(cli.verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let app_error = e.downcast_ref::<AppError>();
            let error_code = app_error.map_or("INTERNAL_ERROR", AppError::error_code);
            tracing::error!(error_code, "{e:#}");
            ExitCode::from(app_error.map_or(70, AppError::exit_code))
        }
    }
}
