use std::path::PathBuf;

use metaspn_gates_types::{ComparisonOp, UnknownVariant};
use thiserror::Error;

/// Errors raised while turning a configuration document into a
/// [`StateMachineConfig`](metaspn_gates_types::StateMachineConfig).
///
/// Parsing is all-or-nothing: any of these aborts before a configuration is
/// returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be a non-empty string")]
    MissingString(String),

    #[error("{field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("gates must be a non-empty list")]
    NoGates,

    #[error("duplicate gate_id: {0}")]
    DuplicateGateId(String),

    #[error(
        "gate {gate_id}: min_soft_passed ({min_soft_passed}) cannot exceed number of soft_thresholds ({thresholds})"
    )]
    QuorumTooLarge {
        gate_id: String,
        min_soft_passed: u64,
        thresholds: usize,
    },

    #[error("{field}: {source}")]
    Unsupported {
        field: String,
        #[source]
        source: UnknownVariant,
    },

    #[error("{field}: operator {op} requires a comparison value")]
    MissingValue { field: String, op: ComparisonOp },

    #[error("{backend} validation failed: {message}")]
    SchemaValidation { backend: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "config parsing failed for {}: provide JSON content or plug in a schema backend that can parse it",
        path.display()
    )]
    Undecodable { path: PathBuf },

    #[error("top-level config must be an object")]
    NotAnObject,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
