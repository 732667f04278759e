use metaspn_gates_types::{ComparisonOp, ContractError};
use thiserror::Error;

/// Errors from gate evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("gate {gate_id}, predicate {predicate_id}: {source}")]
    Incomparable {
        gate_id: String,
        predicate_id: String,
        #[source]
        source: Incomparable,
    },

    #[error("contract violation: {0}")]
    Contract(#[from] ContractError),
}

/// Operands an ordering or membership operator cannot be applied to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{op} cannot compare {actual} at {field} with {expected} operand")]
pub struct Incomparable {
    pub op: ComparisonOp,
    pub field: String,
    pub actual: &'static str,
    pub expected: &'static str,
}

/// Errors from applying decisions to entity state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("contract violation: {0}")]
    Contract(#[from] ContractError),

    #[error("envelope for task {task_id} of gate {gate_id}: {message}")]
    Envelope {
        task_id: String,
        gate_id: String,
        message: String,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
pub type ApplyResult<T> = Result<T, ApplyError>;
