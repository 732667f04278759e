use thiserror::Error;

/// Contract violations on caller-supplied entity state.
///
/// These are raised before any work happens, so the caller's state is never
/// partially updated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("entity_state must be an object")]
    NotAnObject,

    #[error("entity_state.{field} must be {expected} when present")]
    WrongShape {
        field: &'static str,
        expected: &'static str,
    },

    #[error("entity_state is malformed: {0}")]
    Malformed(String),

    #[error("entity_state.entity_id is required when schema envelopes are requested")]
    MissingEntityId,

    #[error("entity_state cannot be serialized: {0}")]
    Unserializable(String),
}

/// A string did not name any variant of a closed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
