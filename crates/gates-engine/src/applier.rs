//! State applier: folds a batch of decisions into a new entity state.

use std::fmt;
use std::sync::Arc;

use metaspn_gates_types::{
    Emission, EntityState, GateDecision, TransitionApplied, EMISSION_KIND_TASK_ENQUEUED,
};
use tracing::info;

use crate::envelope::{EnvelopeBuilder, EnvelopeRequest, DEFAULT_TASK_PRIORITY, UNKNOWN_CAUSE};
use crate::error::ApplyResult;

/// Knobs for [`apply_decisions`].
#[derive(Clone)]
pub struct ApplyOptions {
    /// Upstream signal recorded on transitions and emissions.
    pub caused_by: Option<String>,
    /// Attach a `schema` envelope to each emission. Requires `entity_id`.
    pub envelopes: Option<Arc<dyn EnvelopeBuilder>>,
    pub default_task_priority: u32,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            caused_by: None,
            envelopes: None,
            default_task_priority: DEFAULT_TASK_PRIORITY,
        }
    }
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caused_by(mut self, caused_by: impl Into<String>) -> Self {
        self.caused_by = Some(caused_by.into());
        self
    }

    pub fn with_envelopes(mut self, builder: Arc<dyn EnvelopeBuilder>) -> Self {
        self.envelopes = Some(builder);
        self
    }

    pub fn with_default_task_priority(mut self, priority: u32) -> Self {
        self.default_task_priority = priority;
        self
    }
}

impl fmt::Debug for ApplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("caused_by", &self.caused_by)
            .field("envelopes", &self.envelopes.is_some())
            .field("default_task_priority", &self.default_task_priority)
            .finish()
    }
}

/// Apply `decisions` to a copy of `entity`.
///
/// Every decision is logged to `gate_attempts`. A passing decision moves the
/// entity to its `to_state`, is recorded in `transitions_applied` and emits
/// one task per `enqueue_tasks_on_pass` entry. Cooldown keys are refreshed
/// according to each decision's `cooldown_on` policy. When several decisions
/// pass, the last one determines the final state.
pub fn apply_decisions(
    entity: &EntityState,
    decisions: &[GateDecision],
    options: &ApplyOptions,
) -> ApplyResult<(EntityState, Vec<Emission>)> {
    let emits_tasks = decisions
        .iter()
        .any(|d| d.passed && !d.enqueue_tasks_on_pass.is_empty());
    let envelope_entity_id = match &options.envelopes {
        Some(_) if emits_tasks => Some(entity.required_entity_id()?.to_string()),
        _ => None,
    };

    let mut next = entity.clone();
    let mut emissions = Vec::new();

    for decision in decisions {
        let attempted = &decision.transition_attempted;
        next.gate_attempts.push(attempted.clone());

        if decision.passed {
            next.state = Some(decision.to_state.clone());
            next.transitions_applied.push(TransitionApplied {
                gate_id: decision.gate_id.clone(),
                from_state: decision.from_state.clone(),
                to_state: decision.to_state.clone(),
                caused_by: options.caused_by.clone(),
                timestamp: attempted.timestamp,
                snapshot: attempted.snapshot.clone(),
            });
            info!(
                gate_id = %decision.gate_id,
                from = %decision.from_state,
                to = %decision.to_state,
                "transition applied"
            );

            for task_id in &decision.enqueue_tasks_on_pass {
                let schema = match (&options.envelopes, envelope_entity_id.as_deref()) {
                    (Some(builder), Some(entity_id)) => builder.build(&EnvelopeRequest {
                        task_id,
                        gate_id: &decision.gate_id,
                        entity_id,
                        caused_by: options.caused_by.as_deref().unwrap_or(UNKNOWN_CAUSE),
                        created_at: attempted.timestamp,
                        priority: options.default_task_priority,
                    })?,
                    _ => None,
                };

                info!(task_id = %task_id, gate_id = %decision.gate_id, "task enqueued");
                emissions.push(Emission {
                    kind: EMISSION_KIND_TASK_ENQUEUED.to_string(),
                    task_id: task_id.clone(),
                    gate_id: decision.gate_id.clone(),
                    gate_version: decision.gate_version.clone(),
                    entity_id: next.entity_id.clone(),
                    from_state: decision.from_state.clone(),
                    to_state: decision.to_state.clone(),
                    caused_by: options.caused_by.clone(),
                    timestamp: attempted.timestamp,
                    schema,
                });
            }
        }

        if decision.refreshes_cooldown() {
            next.gate_cooldowns
                .insert(decision.cooldown_scope_key.clone(), attempted.timestamp);
        }
    }

    Ok((next, emissions))
}

/// Decode caller JSON and apply in one step.
///
/// Wrong-shaped history collections are rejected before any decision is
/// applied.
pub fn apply_to_value(
    entity: serde_json::Value,
    decisions: &[GateDecision],
    options: &ApplyOptions,
) -> ApplyResult<(EntityState, Vec<Emission>)> {
    let entity = EntityState::from_value(entity)?;
    apply_decisions(&entity, decisions, options)
}
