//! Cooldown keys and window checks.

use chrono::{DateTime, TimeDelta, Utc};
use metaspn_gates_types::{EntityState, GateConfig};
use serde_json::Value;

use crate::path::resolve;

/// Placeholder for a scope value the features do not carry.
pub const UNSCOPED: &str = "*";

/// Key under `gate_cooldowns` that `gate` reads and refreshes.
///
/// `entity` scope uses the bare gate id; narrower scopes append the channel
/// and/or playbook values found in the features.
pub fn scope_key(gate: &GateConfig, features: &Value) -> String {
    let mut key = gate.gate_id.clone();
    if gate.cooldown_scope.uses_channel() {
        key.push_str("|channel=");
        key.push_str(&scope_value(features, &gate.cooldown_channel_field));
    }
    if gate.cooldown_scope.uses_playbook() {
        key.push_str("|playbook=");
        key.push_str(&scope_value(features, &gate.cooldown_playbook_field));
    }
    key
}

fn scope_value(features: &Value, field: &str) -> String {
    match resolve(features, field) {
        None | Some(Value::Null) => UNSCOPED.to_string(),
        Some(Value::String(s)) if s.is_empty() => UNSCOPED.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Whether `now` falls inside the cooldown window recorded under `key`.
///
/// The window is half-open: at exactly `last + cooldown_seconds` the gate is
/// free again.
pub fn cooldown_active(gate: &GateConfig, key: &str, entity: &EntityState, now: DateTime<Utc>) -> bool {
    if gate.cooldown_seconds == 0 {
        return false;
    }
    let Some(last) = entity.cooldown_for(key) else {
        return false;
    };

    let until = i64::try_from(gate.cooldown_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|window| last.checked_add_signed(window));

    match until {
        Some(until) => now < until,
        // Window extends past the representable range.
        None => true,
    }
}
