//! Digest-ready decision traces.

use chrono::{DateTime, Utc};
use metaspn_gates_types::{timestamp, GateDecision};
use serde::{Deserialize, Serialize};

/// One explained decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRow {
    pub gate_id: String,
    pub from_state: String,
    pub to_state: String,
    pub passed: bool,
    pub blocked: bool,
    /// Failure reason, or `passed` / `blocked` when the decision has none.
    pub reason: String,
    pub failed_requirement_id: Option<String>,
    pub cooldown_active: bool,
    #[serde(with = "timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
}

impl From<&GateDecision> for TraceRow {
    fn from(decision: &GateDecision) -> Self {
        let reason = match decision.reason.as_deref() {
            Some(reason) if !reason.is_empty() => reason.to_string(),
            _ if decision.passed => "passed".to_string(),
            _ => "blocked".to_string(),
        };
        Self {
            gate_id: decision.gate_id.clone(),
            from_state: decision.from_state.clone(),
            to_state: decision.to_state.clone(),
            passed: decision.passed,
            blocked: !decision.passed,
            reason,
            failed_requirement_id: decision.failed_requirement_id.clone(),
            cooldown_active: decision.cooldown_active,
            timestamp: decision.timestamp(),
        }
    }
}

/// Rows sorted by `(gate_id, timestamp)`.
pub fn format_decision_trace<'a, I>(decisions: I) -> Vec<TraceRow>
where
    I: IntoIterator<Item = &'a GateDecision>,
{
    let mut rows: Vec<TraceRow> = decisions.into_iter().map(TraceRow::from).collect();
    rows.sort_by(|a, b| (&a.gate_id, a.timestamp).cmp(&(&b.gate_id, b.timestamp)));
    rows
}
