//! spn-gates - command-line interface for MetaSPN gates
//!
//! This CLI lets operators:
//! - Validate a state machine configuration
//! - Evaluate gates for one entity and optionally apply the decisions
//! - Label historical attempts and print calibration proposals

use std::ffi::OsString;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use metaspn_gates_config::{ConfigLoader, YamlSchemaBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
pub mod output;

use commands::{calibrate, evaluate, validate};
pub use error::{CliError, CliResult};

/// spn-gates CLI application
#[derive(Parser)]
#[command(name = "spn-gates")]
#[command(about = "spn-gates - MetaSPN gate evaluation and calibration CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (table, json, yaml)
    #[arg(short, long, global = true, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration files through the YAML backend
    #[arg(long, global = true, env = "SPN_GATES_YAML")]
    yaml: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Load a configuration and list its gates
    Validate {
        /// Configuration file
        config: std::path::PathBuf,
    },

    /// Evaluate gates for an entity
    Evaluate(evaluate::EvaluateArgs),

    /// Label attempts against outcomes and propose adjustments
    Calibrate(calibrate::CalibrateArgs),
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Logs go to stderr so json/yaml output stays machine readable.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let loader = if cli.yaml {
        ConfigLoader::new().with_backend(Arc::new(YamlSchemaBackend))
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Validate { config } => validate::execute(&loader, &config, cli.output),
        Commands::Evaluate(args) => evaluate::execute(&loader, args, cli.output),
        Commands::Calibrate(args) => calibrate::execute(args, cli.output),
    }
}
