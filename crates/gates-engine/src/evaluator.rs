//! Decision engine: evaluates every matching gate for one entity.
//!
//! Per gate, in order:
//!
//! 1. match filter (`from_state`, `track`)
//! 2. cooldown check
//! 3. suppression flag
//! 4. hard requirements, short-circuit on first failure
//! 5. soft thresholds, all counted, quorum applied
//! 6. operator failure override
//!
//! The engine never reads the clock; `now` is supplied by the caller.

use chrono::{DateTime, Utc};
use metaspn_gates_types::{
    reason, DecisionSnapshot, EntityState, GateConfig, GateDecision, PredicateSource,
    StateMachineConfig, TransitionAttempted,
};
use serde_json::Value;
use tracing::debug;

use crate::cooldown::{cooldown_active, scope_key};
use crate::error::{EngineError, EngineResult};
use crate::path::resolve;
use crate::predicate::predicate_holds;

/// Result of the predicate stages for one gate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Passed {
        soft_passed: Option<usize>,
    },
    Blocked {
        reason: String,
        failed_requirement_id: Option<String>,
        soft_passed: Option<usize>,
    },
}

impl Verdict {
    fn blocked(reason: &str) -> Self {
        Self::Blocked {
            reason: reason.to_string(),
            failed_requirement_id: None,
            soft_passed: None,
        }
    }
}

/// Evaluates state-machine gates.
///
/// Stateless and pure: identical inputs yield identical decisions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every gate matching the entity's state and track, in
    /// configuration order.
    pub fn evaluate(
        &self,
        config: &StateMachineConfig,
        entity: &EntityState,
        features: &Value,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<GateDecision>> {
        let entity_snapshot = entity.to_value()?;
        let mut decisions = Vec::new();

        for gate in config.gates() {
            if !gate.matches(entity.state.as_deref(), entity.track.as_deref()) {
                continue;
            }

            let cooldown_key = scope_key(gate, features);
            let in_cooldown = cooldown_active(gate, &cooldown_key, entity, now);

            let verdict = if in_cooldown {
                Verdict::blocked(reason::COOLDOWN_ACTIVE)
            } else if self.is_suppressed(gate, features) {
                Verdict::blocked(reason::SUPPRESSED)
            } else {
                self.check_predicates(gate, features, &entity_snapshot)?
            };

            let (passed, mut reason, failed_requirement_id, soft_passed) = match verdict {
                Verdict::Passed { soft_passed } => (true, None, None, soft_passed),
                Verdict::Blocked {
                    reason,
                    failed_requirement_id,
                    soft_passed,
                } => (false, Some(reason), failed_requirement_id, soft_passed),
            };

            // Overrides relabel a failure; they never turn it into a pass.
            if !passed {
                if let Some(manual) = entity.failure_override(&gate.gate_id) {
                    reason = Some(manual.to_string());
                }
            }

            debug!(
                gate_id = %gate.gate_id,
                passed,
                reason = reason.as_deref().unwrap_or("-"),
                cooldown_active = in_cooldown,
                "gate evaluated"
            );

            let snapshot = DecisionSnapshot {
                feature_snapshot: features.clone(),
                entity_snapshot: entity_snapshot.clone(),
                config_version: config.config_version.clone(),
                gate_version: gate.version.clone(),
                timestamp: now,
                cooldown_active: in_cooldown,
            };

            decisions.push(GateDecision {
                gate_id: gate.gate_id.clone(),
                gate_version: gate.version.clone(),
                track: gate.track.clone(),
                from_state: gate.from_state.clone(),
                to_state: gate.to_state.clone(),
                passed,
                reason: reason.clone(),
                failed_requirement_id: failed_requirement_id.clone(),
                cooldown_active: in_cooldown,
                cooldown_on: gate.cooldown_on,
                cooldown_scope: gate.cooldown_scope,
                cooldown_scope_key: cooldown_key,
                soft_passed,
                enqueue_tasks_on_pass: gate.enqueue_tasks_on_pass.clone(),
                transition_attempted: TransitionAttempted {
                    gate_id: gate.gate_id.clone(),
                    from_state: gate.from_state.clone(),
                    to_state: gate.to_state.clone(),
                    passed,
                    reason,
                    failed_requirement_id,
                    timestamp: now,
                    snapshot,
                },
            });
        }

        Ok(decisions)
    }

    fn is_suppressed(&self, gate: &GateConfig, features: &Value) -> bool {
        gate.suppression_field
            .as_deref()
            .and_then(|field| resolve(features, field))
            .is_some_and(|flag| *flag == Value::Bool(true))
    }

    fn check_predicates(
        &self,
        gate: &GateConfig,
        features: &Value,
        entity_snapshot: &Value,
    ) -> EngineResult<Verdict> {
        let source_for = |source: PredicateSource| match source {
            PredicateSource::Features => features,
            PredicateSource::Entity => entity_snapshot,
        };

        for requirement in &gate.hard_requirements {
            let predicate = &requirement.predicate;
            let holds = predicate_holds(source_for(predicate.source), predicate).map_err(|source| {
                EngineError::Incomparable {
                    gate_id: gate.gate_id.clone(),
                    predicate_id: requirement.requirement_id.clone(),
                    source,
                }
            })?;
            if !holds {
                return Ok(Verdict::Blocked {
                    reason: gate.failure_reason_for(&requirement.requirement_id).to_string(),
                    failed_requirement_id: Some(requirement.requirement_id.clone()),
                    soft_passed: None,
                });
            }
        }

        let mut satisfied = 0;
        for threshold in &gate.soft_thresholds {
            let predicate = &threshold.predicate;
            let holds = predicate_holds(source_for(predicate.source), predicate).map_err(|source| {
                EngineError::Incomparable {
                    gate_id: gate.gate_id.clone(),
                    predicate_id: threshold.threshold_id.clone(),
                    source,
                }
            })?;
            if holds {
                satisfied += 1;
            }
        }

        if satisfied < gate.required_soft_passes() {
            Ok(Verdict::Blocked {
                reason: reason::SOFT_THRESHOLD_FAILED.to_string(),
                failed_requirement_id: None,
                soft_passed: Some(satisfied),
            })
        } else {
            Ok(Verdict::Passed {
                soft_passed: Some(satisfied),
            })
        }
    }
}

/// Evaluate `config` against one entity with a fresh [`Evaluator`].
pub fn evaluate_gates(
    config: &StateMachineConfig,
    entity: &EntityState,
    features: &Value,
    now: DateTime<Utc>,
) -> EngineResult<Vec<GateDecision>> {
    Evaluator::new().evaluate(config, entity, features, now)
}
