//! Document → [`StateMachineConfig`] conversion.
//!
//! The document is walked by hand rather than deserialized directly so every
//! rejection names the offending path (`gates[1].soft_thresholds[0].op`).

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use metaspn_gates_types::{
    ComparisonOp, CooldownPolicy, CooldownScope, GateConfig, HardRequirement, Predicate,
    PredicateSource, SoftThreshold, StateMachineConfig, UnknownVariant,
    DEFAULT_COOLDOWN_CHANNEL_FIELD, DEFAULT_COOLDOWN_PLAYBOOK_FIELD,
};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};

/// Build a configuration from an already-decoded document.
///
/// No schema backend is consulted; see [`ConfigLoader`](crate::ConfigLoader)
/// for that.
pub fn build_state_machine_config(payload: &Value) -> ConfigResult<StateMachineConfig> {
    let Value::Object(map) = payload else {
        return Err(ConfigError::NotAnObject);
    };
    let root = Fields {
        map,
        path: String::new(),
    };

    let config_version = root.required_str("config_version")?;

    let raw_gates = match root.get("gates") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(ConfigError::NoGates),
    };

    let mut seen = BTreeSet::new();
    let mut gates = Vec::with_capacity(raw_gates.len());
    for (index, raw) in raw_gates.iter().enumerate() {
        let gate = parse_gate(raw, format!("gates[{index}]"))?;
        if !seen.insert(gate.gate_id.clone()) {
            return Err(ConfigError::DuplicateGateId(gate.gate_id));
        }
        gates.push(gate);
    }

    Ok(StateMachineConfig::new(config_version, gates))
}

fn parse_gate(raw: &Value, path: String) -> ConfigResult<GateConfig> {
    let fields = Fields::of(raw, path, "an object")?;

    let gate_id = fields.required_str("gate_id")?;
    let mut gate = GateConfig::new(
        gate_id,
        fields.required_str("version")?,
        fields.required_str("from")?,
        fields.required_str("to")?,
    );
    gate.track = fields.optional_str("track")?;

    for (index, item) in fields.list("hard_requirements")?.iter().enumerate() {
        let entry = Fields::of(item, fields.key(&format!("hard_requirements[{index}]")), "an object")?;
        gate.hard_requirements.push(HardRequirement {
            requirement_id: entry.required_str("requirement_id")?,
            predicate: parse_predicate(&entry, false)?,
        });
    }

    for (index, item) in fields.list("soft_thresholds")?.iter().enumerate() {
        let entry = Fields::of(item, fields.key(&format!("soft_thresholds[{index}]")), "an object")?;
        gate.soft_thresholds.push(SoftThreshold {
            threshold_id: entry.required_str("threshold_id")?,
            predicate: parse_predicate(&entry, true)?,
        });
    }

    if let Some(quorum) = fields.non_negative_int("min_soft_passed")? {
        if quorum > gate.soft_thresholds.len() as u64 {
            return Err(ConfigError::QuorumTooLarge {
                gate_id: gate.gate_id,
                min_soft_passed: quorum,
                thresholds: gate.soft_thresholds.len(),
            });
        }
        gate.min_soft_passed = Some(quorum as usize);
    }

    gate.cooldown_seconds = fields.non_negative_int("cooldown_seconds")?.unwrap_or(0);
    gate.cooldown_on = fields
        .optional_variant::<CooldownPolicy>("cooldown_on")?
        .unwrap_or_default();
    gate.cooldown_scope = fields
        .optional_variant::<CooldownScope>("cooldown_scope")?
        .unwrap_or_default();
    gate.cooldown_channel_field = fields
        .optional_str("cooldown_channel_field")?
        .unwrap_or_else(|| DEFAULT_COOLDOWN_CHANNEL_FIELD.to_string());
    gate.cooldown_playbook_field = fields
        .optional_str("cooldown_playbook_field")?
        .unwrap_or_else(|| DEFAULT_COOLDOWN_PLAYBOOK_FIELD.to_string());
    gate.suppression_field = fields.optional_str("suppression_field")?;

    for (index, task) in fields.list("enqueue_tasks_on_pass")?.iter().enumerate() {
        match task {
            Value::String(task_id) if !task_id.is_empty() => {
                gate.enqueue_tasks_on_pass.push(task_id.clone())
            }
            _ => {
                return Err(ConfigError::MissingString(
                    fields.key(&format!("enqueue_tasks_on_pass[{index}]")),
                ))
            }
        }
    }

    gate.failure_taxonomy = fields.string_map("failure_taxonomy")?;

    Ok(gate)
}

/// `value_key_required` demands an explicit `value` key for every operator
/// that compares against one.
fn parse_predicate(entry: &Fields<'_>, value_key_required: bool) -> ConfigResult<Predicate> {
    let field = entry.required_str("field")?;
    let op: ComparisonOp = entry.required_variant("op")?;
    let source = entry
        .optional_variant::<PredicateSource>("source")?
        .unwrap_or_default();

    let value = entry.get("value").cloned();
    if !op.is_presence_check() {
        let missing = if op.requires_value() {
            value.is_none()
        } else {
            value_key_required && !entry.map.contains_key("value")
        };
        if missing {
            return Err(ConfigError::MissingValue {
                field: entry.key("value"),
                op,
            });
        }
    }
    if matches!(op, ComparisonOp::In | ComparisonOp::NotIn)
        && !matches!(
            value,
            Some(Value::Array(_) | Value::String(_) | Value::Object(_))
        )
    {
        return Err(ConfigError::WrongType {
            field: entry.key("value"),
            expected: "an array, string or object for membership operators",
        });
    }

    Ok(Predicate {
        field,
        op,
        value,
        source,
    })
}

// ── Field access ────────────────────────────────────────────────────────

struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value, path: String, expected: &'static str) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            _ => Err(ConfigError::WrongType {
                field: path,
                expected,
            }),
        }
    }

    fn key(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// `null` is treated the same as an absent key.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn required_str(&self, key: &str) -> ConfigResult<String> {
        match self.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            _ => Err(ConfigError::MissingString(self.key(key))),
        }
    }

    /// Empty strings count as absent.
    fn optional_str(&self, key: &str) -> ConfigResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigError::WrongType {
                field: self.key(key),
                expected: "a string",
            }),
        }
    }

    fn required_variant<T>(&self, key: &str) -> ConfigResult<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        let raw = self.required_str(key)?;
        self.variant(key, &raw)
    }

    fn optional_variant<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        self.optional_str(key)?
            .map(|raw| self.variant(key, &raw))
            .transpose()
    }

    fn variant<T>(&self, key: &str, raw: &str) -> ConfigResult<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        raw.parse().map_err(|source| ConfigError::Unsupported {
            field: self.key(key),
            source,
        })
    }

    fn non_negative_int(&self, key: &str) -> ConfigResult<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| ConfigError::WrongType {
                field: self.key(key),
                expected: "a non-negative integer",
            }),
        }
    }

    fn list(&self, key: &str) -> ConfigResult<&'a [Value]> {
        match self.get(key) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(ConfigError::WrongType {
                field: self.key(key),
                expected: "a list",
            }),
        }
    }

    /// Object whose values are coerced to strings.
    fn string_map(&self, key: &str) -> ConfigResult<BTreeMap<String, String>> {
        match self.get(key) {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(map)) => Ok(map
                .iter()
                .map(|(k, v)| {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect()),
            Some(_) => Err(ConfigError::WrongType {
                field: self.key(key),
                expected: "an object",
            }),
        }
    }
}
