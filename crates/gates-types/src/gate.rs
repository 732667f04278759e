//! Gate rule model.
//!
//! A gate guards one `from_state -> to_state` transition. Its predicates are
//! split into hard requirements (all must hold, evaluated in order with
//! short-circuit) and soft thresholds (a quorum must hold).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decision::reason;
use crate::error::UnknownVariant;

pub const DEFAULT_COOLDOWN_CHANNEL_FIELD: &str = "context.channel";
pub const DEFAULT_COOLDOWN_PLAYBOOK_FIELD: &str = "context.playbook";

// ── Predicate ───────────────────────────────────────────────────────────

/// Which snapshot a predicate's dotted path is resolved against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateSource {
    #[default]
    Features,
    Entity,
}

impl PredicateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Features => "features",
            Self::Entity => "entity",
        }
    }
}

impl FromStr for PredicateSource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "features" => Ok(Self::Features),
            "entity" => Ok(Self::Entity),
            other => Err(UnknownVariant::new("predicate source", other)),
        }
    }
}

/// Comparison operator of a predicate.
///
/// Closed set: configuration naming any other operator is rejected at parse
/// time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Exists,
    NotExists,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 10] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Exists,
        Self::NotExists,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
        }
    }

    /// `exists` / `not_exists` only look at path presence.
    pub fn is_presence_check(&self) -> bool {
        matches!(self, Self::Exists | Self::NotExists)
    }

    /// Ordering and membership operators have no meaning without an operand.
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::In | Self::NotIn
        )
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOp {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("comparison operator", s))
    }
}

/// A single comparison against a dotted path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub op: ComparisonOp,
    /// Absent for `exists` / `not_exists`. For `eq` / `ne`, absence compares
    /// against JSON `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub source: PredicateSource,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: ComparisonOp) -> Self {
        Self {
            field: field.into(),
            op,
            value: None,
            source: PredicateSource::Features,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn from_entity(mut self) -> Self {
        self.source = PredicateSource::Entity;
        self
    }
}

/// A mandatory predicate. The first failing one blocks the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HardRequirement {
    pub requirement_id: String,
    #[serde(flatten)]
    pub predicate: Predicate,
}

impl HardRequirement {
    pub fn new(requirement_id: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            requirement_id: requirement_id.into(),
            predicate,
        }
    }
}

/// A predicate contributing to the soft-pass quorum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftThreshold {
    pub threshold_id: String,
    #[serde(flatten)]
    pub predicate: Predicate,
}

impl SoftThreshold {
    pub fn new(threshold_id: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            threshold_id: threshold_id.into(),
            predicate,
        }
    }
}

// ── Cooldown ────────────────────────────────────────────────────────────

/// When a gate's cooldown timestamp is refreshed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownPolicy {
    /// Only a passing decision starts the cooldown.
    #[default]
    Pass,
    /// Every attempt, pass or fail, starts the cooldown.
    Attempt,
}

impl CooldownPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Attempt => "attempt",
        }
    }

    /// Whether a decision with the given verdict refreshes the cooldown.
    pub fn applies_to(&self, passed: bool) -> bool {
        match self {
            Self::Attempt => true,
            Self::Pass => passed,
        }
    }
}

impl FromStr for CooldownPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(Self::Pass),
            "attempt" => Ok(Self::Attempt),
            other => Err(UnknownVariant::new("cooldown_on policy", other)),
        }
    }
}

/// Granularity of the cooldown key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// One cooldown per gate on the entity.
    #[default]
    Entity,
    /// One cooldown per gate and channel.
    Channel,
    /// One cooldown per gate and playbook.
    Playbook,
    /// One cooldown per gate, channel and playbook.
    ChannelPlaybook,
}

impl CooldownScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Channel => "channel",
            Self::Playbook => "playbook",
            Self::ChannelPlaybook => "channel_playbook",
        }
    }

    pub fn uses_channel(&self) -> bool {
        matches!(self, Self::Channel | Self::ChannelPlaybook)
    }

    pub fn uses_playbook(&self) -> bool {
        matches!(self, Self::Playbook | Self::ChannelPlaybook)
    }
}

impl FromStr for CooldownScope {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entity" => Ok(Self::Entity),
            "channel" => Ok(Self::Channel),
            "playbook" => Ok(Self::Playbook),
            "channel_playbook" => Ok(Self::ChannelPlaybook),
            other => Err(UnknownVariant::new("cooldown_scope", other)),
        }
    }
}

// ── Gate ────────────────────────────────────────────────────────────────

fn default_channel_field() -> String {
    DEFAULT_COOLDOWN_CHANNEL_FIELD.to_string()
}

fn default_playbook_field() -> String {
    DEFAULT_COOLDOWN_PLAYBOOK_FIELD.to_string()
}

/// A named, versioned rule guarding one state transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    pub gate_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(rename = "from")]
    pub from_state: String,
    #[serde(rename = "to")]
    pub to_state: String,
    #[serde(default)]
    pub hard_requirements: Vec<HardRequirement>,
    #[serde(default)]
    pub soft_thresholds: Vec<SoftThreshold>,
    /// Soft quorum. `None` means every threshold must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_soft_passed: Option<usize>,
    #[serde(default)]
    pub cooldown_seconds: u64,
    #[serde(default)]
    pub cooldown_on: CooldownPolicy,
    #[serde(default)]
    pub cooldown_scope: CooldownScope,
    #[serde(default = "default_channel_field")]
    pub cooldown_channel_field: String,
    #[serde(default = "default_playbook_field")]
    pub cooldown_playbook_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppression_field: Option<String>,
    #[serde(default)]
    pub enqueue_tasks_on_pass: Vec<String>,
    /// Requirement id → human-readable failure reason.
    #[serde(default)]
    pub failure_taxonomy: BTreeMap<String, String>,
}

impl GateConfig {
    pub fn new(
        gate_id: impl Into<String>,
        version: impl Into<String>,
        from_state: impl Into<String>,
        to_state: impl Into<String>,
    ) -> Self {
        Self {
            gate_id: gate_id.into(),
            version: version.into(),
            track: None,
            from_state: from_state.into(),
            to_state: to_state.into(),
            hard_requirements: Vec::new(),
            soft_thresholds: Vec::new(),
            min_soft_passed: None,
            cooldown_seconds: 0,
            cooldown_on: CooldownPolicy::Pass,
            cooldown_scope: CooldownScope::Entity,
            cooldown_channel_field: default_channel_field(),
            cooldown_playbook_field: default_playbook_field(),
            suppression_field: None,
            enqueue_tasks_on_pass: Vec::new(),
            failure_taxonomy: BTreeMap::new(),
        }
    }

    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    pub fn with_hard_requirement(mut self, requirement: HardRequirement) -> Self {
        self.hard_requirements.push(requirement);
        self
    }

    pub fn with_soft_threshold(mut self, threshold: SoftThreshold) -> Self {
        self.soft_thresholds.push(threshold);
        self
    }

    pub fn with_min_soft_passed(mut self, quorum: usize) -> Self {
        self.min_soft_passed = Some(quorum);
        self
    }

    pub fn with_cooldown(mut self, seconds: u64, policy: CooldownPolicy) -> Self {
        self.cooldown_seconds = seconds;
        self.cooldown_on = policy;
        self
    }

    pub fn with_cooldown_scope(mut self, scope: CooldownScope) -> Self {
        self.cooldown_scope = scope;
        self
    }

    pub fn with_suppression_field(mut self, field: impl Into<String>) -> Self {
        self.suppression_field = Some(field.into());
        self
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.enqueue_tasks_on_pass.push(task_id.into());
        self
    }

    pub fn with_failure_reason(
        mut self,
        requirement_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.failure_taxonomy
            .insert(requirement_id.into(), reason.into());
        self
    }

    /// Number of soft thresholds that must hold for the soft stage to pass.
    pub fn required_soft_passes(&self) -> usize {
        self.min_soft_passed.unwrap_or(self.soft_thresholds.len())
    }

    /// Failure reason for a failed hard requirement.
    pub fn failure_reason_for(&self, requirement_id: &str) -> &str {
        self.failure_taxonomy
            .get(requirement_id)
            .map(String::as_str)
            .unwrap_or(reason::HARD_REQUIREMENT_FAILED)
    }

    /// Whether this gate applies to an entity in `state` on `track`.
    pub fn matches(&self, state: Option<&str>, track: Option<&str>) -> bool {
        if state != Some(self.from_state.as_str()) {
            return false;
        }
        match &self.track {
            None => true,
            Some(gate_track) => track == Some(gate_track.as_str()),
        }
    }

    /// Deterministic evaluation order key.
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (
            self.track.as_deref().unwrap_or(""),
            self.from_state.as_str(),
            self.gate_id.as_str(),
        )
    }
}

// ── State machine ───────────────────────────────────────────────────────

/// An ordered, immutable collection of gates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateMachineConfig {
    pub config_version: String,
    gates: Vec<GateConfig>,
}

impl StateMachineConfig {
    /// Build a configuration; gates are sorted by `(track, from_state, gate_id)`.
    pub fn new(config_version: impl Into<String>, mut gates: Vec<GateConfig>) -> Self {
        gates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self {
            config_version: config_version.into(),
            gates,
        }
    }

    pub fn gates(&self) -> &[GateConfig] {
        &self.gates
    }

    pub fn gate(&self, gate_id: &str) -> Option<&GateConfig> {
        self.gates.iter().find(|g| g.gate_id == gate_id)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
