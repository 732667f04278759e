//! Calibration records.

use std::fmt;

use chrono::{DateTime, Utc};
use metaspn_gates_types::timestamp;
use serde::{Deserialize, Serialize};

/// One historical gate evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_id: String,
    pub gate_id: String,
    #[serde(with = "timestamp::lenient")]
    pub attempted_at: DateTime<Utc>,
    pub passed: bool,
}

/// An externally observed outcome for the entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    #[serde(with = "timestamp::lenient")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub success: bool,
}

/// Hindsight verdict on one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeLabel {
    /// Passed, and success followed.
    TruePositive,
    /// Passed, but no success followed in the window.
    MovedTooEarly,
    /// Blocked, yet success followed anyway.
    FalseNegative,
    /// Blocked, and no success followed.
    TrueNegative,
}

impl OutcomeLabel {
    pub fn classify(passed: bool, success_observed: bool) -> Self {
        match (passed, success_observed) {
            (true, true) => Self::TruePositive,
            (true, false) => Self::MovedTooEarly,
            (false, true) => Self::FalseNegative,
            (false, false) => Self::TrueNegative,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TruePositive => "true_positive",
            Self::MovedTooEarly => "moved_too_early",
            Self::FalseNegative => "false_negative",
            Self::TrueNegative => "true_negative",
        }
    }

    /// The gate decided correctly in hindsight.
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::TruePositive | Self::TrueNegative)
    }
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptOutcomeEvaluation {
    pub attempt_id: String,
    pub gate_id: String,
    pub label: OutcomeLabel,
    pub success_observed: bool,
    /// Outcome events that fell inside the attempt's window.
    pub outcomes_count: usize,
    pub failure_reason: Option<String>,
    #[serde(with = "timestamp::lenient")]
    pub attempted_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    ThresholdAdjustment,
    CooldownAdjustment,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThresholdAdjustment => "threshold_adjustment",
            Self::CooldownAdjustment => "cooldown_adjustment",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recommended adjustment. Advisory only: `auto_apply` is always false.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProposal {
    pub gate_id: String,
    pub recommendation_type: RecommendationType,
    pub direction: Direction,
    pub rationale: String,
    /// Triggering rate, rounded to four decimals.
    pub confidence: f64,
    pub auto_apply: bool,
}

impl CalibrationProposal {
    pub fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            self.gate_id.as_str(),
            self.recommendation_type.as_str(),
            self.direction.as_str(),
            self.rationale.as_str(),
        )
    }
}
