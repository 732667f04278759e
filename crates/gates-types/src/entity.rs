//! Caller-owned entity state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::decision::{TransitionApplied, TransitionAttempted};
use crate::error::ContractError;
use crate::timestamp;

/// Keys that decode to an empty collection when the caller omits them.
const HISTORY_KEYS: [&str; 3] = ["gate_attempts", "transitions_applied", "gate_cooldowns"];

/// A tracked record moving through the pipeline.
///
/// The engine reads it and the applier returns an updated copy; nothing in
/// this workspace mutates a caller's value in place. Fields not modelled
/// here are kept verbatim in `extra` and remain visible to predicates with
/// `source: entity`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    /// Append-only log of every attempt, pass or fail.
    #[serde(default)]
    pub gate_attempts: Vec<TransitionAttempted>,
    /// Append-only log of successful transitions.
    #[serde(default)]
    pub transitions_applied: Vec<TransitionApplied>,
    /// Cooldown key → last refresh time.
    #[serde(default, with = "timestamp::lenient_map")]
    pub gate_cooldowns: BTreeMap<String, DateTime<Utc>>,
    /// Gate id → operator-supplied failure reason.
    #[serde(
        default,
        deserialize_with = "lenient_overrides",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub failure_overrides: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Document this state was decoded from.
    #[serde(skip)]
    source: Option<Arc<SourceDocument>>,
}

/// The caller's document next to its typed reading at decode time.
#[derive(Clone, Debug, PartialEq)]
struct SourceDocument {
    raw: Map<String, Value>,
    decoded: Map<String, Value>,
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            ..Self::default()
        }
    }

    /// Decode caller-supplied JSON, rejecting wrong-shaped history fields.
    ///
    /// The document is retained so [`to_value`](Self::to_value) can hand
    /// it back unchanged.
    pub fn from_value(value: Value) -> Result<Self, ContractError> {
        let Value::Object(raw) = value else {
            return Err(ContractError::NotAnObject);
        };
        check_shape(&raw, "gate_attempts", Value::is_array, "a list")?;
        check_shape(&raw, "transitions_applied", Value::is_array, "a list")?;
        check_shape(&raw, "gate_cooldowns", Value::is_object, "an object")?;

        let mut entity: Self = serde_json::from_value(Value::Object(raw.clone()))
            .map_err(|e| ContractError::Malformed(e.to_string()))?;
        let decoded = entity.typed_fields()?;
        entity.source = Some(Arc::new(SourceDocument { raw, decoded }));
        Ok(entity)
    }

    /// Owned JSON copy, as captured in decision snapshots.
    ///
    /// A decoded state starts from the caller's document: keys it never
    /// carried stay absent and values the typed view ignores survive. Only
    /// fields changed since decoding are written over it. Empty history
    /// collections are never invented.
    pub fn to_value(&self) -> Result<Value, ContractError> {
        let typed = self.typed_fields()?;
        let Some(source) = self.source.as_deref() else {
            let fields = typed
                .into_iter()
                .filter(|(key, value)| !is_defaulted_history(key, value))
                .collect();
            return Ok(Value::Object(fields));
        };

        let mut document = source.raw.clone();
        for key in source.decoded.keys() {
            if !typed.contains_key(key) {
                document.remove(key);
            }
        }
        for (key, value) in typed {
            if source.decoded.get(&key) == Some(&value) {
                continue;
            }
            if is_defaulted_history(&key, &value) && !document.contains_key(&key) {
                continue;
            }
            document.insert(key, value);
        }
        Ok(Value::Object(document))
    }

    fn typed_fields(&self) -> Result<Map<String, Value>, ContractError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ContractError::Unserializable(
                "entity state did not serialize to an object".to_string(),
            )),
            Err(e) => Err(ContractError::Unserializable(e.to_string())),
        }
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    pub fn with_cooldown(mut self, key: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.gate_cooldowns.insert(key.into(), at);
        self
    }

    pub fn with_failure_override(
        mut self,
        gate_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.failure_overrides.insert(gate_id.into(), reason.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn cooldown_for(&self, key: &str) -> Option<DateTime<Utc>> {
        self.gate_cooldowns.get(key).copied()
    }

    /// Non-empty operator override for a gate, if any.
    pub fn failure_override(&self, gate_id: &str) -> Option<&str> {
        self.failure_overrides
            .get(gate_id)
            .map(String::as_str)
            .filter(|reason| !reason.is_empty())
    }

    /// `entity_id` when present and non-empty.
    pub fn required_entity_id(&self) -> Result<&str, ContractError> {
        self.entity_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ContractError::MissingEntityId)
    }
}

fn is_defaulted_history(key: &str, value: &Value) -> bool {
    HISTORY_KEYS.contains(&key)
        && match value {
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
}

fn check_shape(
    map: &Map<String, Value>,
    field: &'static str,
    is_valid: fn(&Value) -> bool,
    expected: &'static str,
) -> Result<(), ContractError> {
    match map.get(field) {
        Some(value) if !is_valid(value) => Err(ContractError::WrongShape { field, expected }),
        _ => Ok(()),
    }
}

/// Overrides are operator annotations; anything that is not a non-empty
/// string is ignored rather than rejected.
fn lenient_overrides<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let Value::Object(map) = raw else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(gate_id, reason)| match reason {
            Value::String(s) if !s.is_empty() => Some((gate_id, s)),
            _ => None,
        })
        .collect())
}
