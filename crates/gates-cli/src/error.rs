//! CLI error types

use metaspn_gates_calibration::CalibrationError;
use metaspn_gates_config::ConfigError;
use metaspn_gates_engine::{ApplyError, EngineError};
use metaspn_gates_types::ContractError;
use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Evaluation error: {0}")]
    Engine(#[from] EngineError),

    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    #[error("Entity state error: {0}")]
    Contract(#[from] ContractError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
