use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp;

pub const EMISSION_KIND_TASK_ENQUEUED: &str = "task_enqueued";

/// One unit of downstream work produced by a passing gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub kind: String,
    pub task_id: String,
    pub gate_id: String,
    pub gate_version: String,
    pub entity_id: Option<String>,
    pub from_state: String,
    pub to_state: String,
    pub caused_by: Option<String>,
    #[serde(with = "timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
    /// Structured task/envelope payload, present only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl Emission {
    pub fn is_task_enqueued(&self) -> bool {
        self.kind == EMISSION_KIND_TASK_ENQUEUED
    }
}
