//! Per-evaluation audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gate::{CooldownPolicy, CooldownScope};
use crate::timestamp;

/// Built-in failure reasons.
pub mod reason {
    pub const COOLDOWN_ACTIVE: &str = "cooldown_active";
    pub const SUPPRESSED: &str = "suppressed";
    pub const HARD_REQUIREMENT_FAILED: &str = "hard_requirement_failed";
    pub const SOFT_THRESHOLD_FAILED: &str = "soft_threshold_failed";
}

/// Full inputs of one gate evaluation, captured for replay.
///
/// Both snapshots are owned deep copies; later changes to the live entity
/// state cannot reach them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionSnapshot {
    pub feature_snapshot: Value,
    pub entity_snapshot: Value,
    pub config_version: String,
    pub gate_version: String,
    #[serde(with = "timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
    pub cooldown_active: bool,
}

/// One evaluated gate, pass or fail.
///
/// Also the shape of every entry in `EntityState::gate_attempts`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionAttempted {
    pub gate_id: String,
    #[serde(rename = "from")]
    pub from_state: String,
    #[serde(rename = "to")]
    pub to_state: String,
    pub passed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub failed_requirement_id: Option<String>,
    #[serde(with = "timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
    pub snapshot: DecisionSnapshot,
}

/// A successful transition, written into the entity's permanent history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionApplied {
    pub gate_id: String,
    #[serde(rename = "from")]
    pub from_state: String,
    #[serde(rename = "to")]
    pub to_state: String,
    #[serde(default)]
    pub caused_by: Option<String>,
    #[serde(with = "timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
    pub snapshot: DecisionSnapshot,
}

/// Verdict for one matching gate together with its emission plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub gate_id: String,
    pub gate_version: String,
    pub track: Option<String>,
    pub from_state: String,
    pub to_state: String,
    pub passed: bool,
    pub reason: Option<String>,
    pub failed_requirement_id: Option<String>,
    pub cooldown_active: bool,
    pub cooldown_on: CooldownPolicy,
    pub cooldown_scope: CooldownScope,
    /// Key under `gate_cooldowns` this gate reads and refreshes.
    pub cooldown_scope_key: String,
    /// Satisfied soft thresholds; `None` when the soft stage was not reached.
    pub soft_passed: Option<usize>,
    pub enqueue_tasks_on_pass: Vec<String>,
    pub transition_attempted: TransitionAttempted,
}

impl GateDecision {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.transition_attempted.timestamp
    }

    pub fn snapshot(&self) -> &DecisionSnapshot {
        &self.transition_attempted.snapshot
    }

    /// Whether applying this decision refreshes its cooldown key.
    pub fn refreshes_cooldown(&self) -> bool {
        self.cooldown_on.applies_to(self.passed)
    }
}
