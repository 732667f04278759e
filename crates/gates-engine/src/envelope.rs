//! Structured task/emission envelopes attached to emissions on request.

use chrono::{DateTime, Utc};
use metaspn_gates_types::{timestamp, EMISSION_KIND_TASK_ENQUEUED};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApplyError, ApplyResult};

pub const DEFAULT_TASK_PRIORITY: u32 = 50;

/// `caused_by` recorded in envelopes when the caller gave none.
pub const UNKNOWN_CAUSE: &str = "unknown";

/// Inputs for one task envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeRequest<'a> {
    pub task_id: &'a str,
    pub gate_id: &'a str,
    pub entity_id: &'a str,
    pub caused_by: &'a str,
    pub created_at: DateTime<Utc>,
    pub priority: u32,
}

impl EnvelopeRequest<'_> {
    /// `{gate_id}:{task_id}:{unix_seconds}`.
    pub fn emission_id(&self) -> String {
        format!(
            "{}:{}:{}",
            self.gate_id,
            self.task_id,
            self.created_at.timestamp()
        )
    }
}

/// Produces the `schema` payload of an emission.
///
/// Returning `Ok(None)` leaves the emission without a `schema` field; an
/// error aborts the whole apply.
pub trait EnvelopeBuilder: Send + Sync {
    fn build(&self, request: &EnvelopeRequest<'_>) -> ApplyResult<Option<Value>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub ref_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    pub gate_id: String,
    pub caused_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub task_type: String,
    #[serde(with = "timestamp::lenient")]
    pub created_at: DateTime<Utc>,
    pub priority: u32,
    pub entity_ref: EntityRef,
    pub context: TaskContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionEnvelope {
    pub emission_id: String,
    #[serde(with = "timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
    pub emission_type: String,
    pub payload: Task,
    pub caused_by: String,
    pub entity_refs: Vec<EntityRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task: Task,
    pub emission_envelope: EmissionEnvelope,
}

/// Default builder: a [`Task`] wrapped in an [`EmissionEnvelope`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskEnvelopeBuilder;

impl TaskEnvelopeBuilder {
    pub fn envelope(&self, request: &EnvelopeRequest<'_>) -> TaskEnvelope {
        let entity_ref = EntityRef {
            ref_type: "entity_id".to_string(),
            value: request.entity_id.to_string(),
        };
        let task = Task {
            task_id: request.task_id.to_string(),
            task_type: request.task_id.to_string(),
            created_at: request.created_at,
            priority: request.priority,
            entity_ref: entity_ref.clone(),
            context: TaskContext {
                gate_id: request.gate_id.to_string(),
                caused_by: request.caused_by.to_string(),
            },
        };
        TaskEnvelope {
            emission_envelope: EmissionEnvelope {
                emission_id: request.emission_id(),
                timestamp: request.created_at,
                emission_type: EMISSION_KIND_TASK_ENQUEUED.to_string(),
                payload: task.clone(),
                caused_by: request.caused_by.to_string(),
                entity_refs: vec![entity_ref],
            },
            task,
        }
    }
}

impl EnvelopeBuilder for TaskEnvelopeBuilder {
    fn build(&self, request: &EnvelopeRequest<'_>) -> ApplyResult<Option<Value>> {
        serde_json::to_value(self.envelope(request))
            .map(Some)
            .map_err(|e| ApplyError::Envelope {
                task_id: request.task_id.to_string(),
                gate_id: request.gate_id.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn request() -> EnvelopeRequest<'static> {
        EnvelopeRequest {
            task_id: "task.review",
            gate_id: "g.qualify.a",
            entity_id: "ent-1",
            caused_by: "sig-123",
            created_at: Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap(),
            priority: DEFAULT_TASK_PRIORITY,
        }
    }

    #[test]
    fn emission_id_uses_unix_seconds() {
        assert_eq!(request().emission_id(), "g.qualify.a:task.review:1770249600");
    }

    #[test]
    fn builds_task_and_envelope() {
        let schema = TaskEnvelopeBuilder.build(&request()).unwrap().unwrap();
        assert_eq!(
            schema["task"],
            json!({
                "task_id": "task.review",
                "task_type": "task.review",
                "created_at": "2026-02-05T00:00:00+00:00",
                "priority": 50,
                "entity_ref": {"ref_type": "entity_id", "value": "ent-1"},
                "context": {"gate_id": "g.qualify.a", "caused_by": "sig-123"}
            })
        );
        let envelope = &schema["emission_envelope"];
        assert_eq!(envelope["emission_type"], "task_enqueued");
        assert_eq!(envelope["emission_id"], "g.qualify.a:task.review:1770249600");
        assert_eq!(envelope["payload"], schema["task"]);
        assert_eq!(envelope["entity_refs"], json!([{"ref_type": "entity_id", "value": "ent-1"}]));
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let envelope = TaskEnvelopeBuilder.envelope(&request());
        let value = serde_json::to_value(&envelope).unwrap();
        let back: TaskEnvelope = serde_json::from_value(value).unwrap();
        assert_eq!(back, envelope);
    }
}
