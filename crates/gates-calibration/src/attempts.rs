//! Attempt records derived from an entity's audit log.

use metaspn_gates_types::EntityState;

use crate::model::AttemptRecord;

/// Prefix used when the entity has no id.
pub const ANONYMOUS_ENTITY: &str = "entity";

/// One [`AttemptRecord`] per `gate_attempts` entry, in log order.
///
/// Ids take the form `{entity_id}:{gate_id}:{index}` where `index` is the
/// position in the whole log.
pub fn attempts_from_entity_state(entity: &EntityState) -> Vec<AttemptRecord> {
    let owner = entity
        .entity_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(ANONYMOUS_ENTITY);

    entity
        .gate_attempts
        .iter()
        .enumerate()
        .map(|(index, attempt)| AttemptRecord {
            attempt_id: format!("{owner}:{}:{index}", attempt.gate_id),
            gate_id: attempt.gate_id.clone(),
            attempted_at: attempt.timestamp,
            passed: attempt.passed,
        })
        .collect()
}
