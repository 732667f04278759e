//! Stage B: per-gate rates turned into advisory proposals.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::CalibrationResult;
use crate::model::{
    AttemptOutcomeEvaluation, CalibrationProposal, Direction, OutcomeLabel, RecommendationType,
};
use crate::policy::CalibrationPolicy;

/// Per-gate label counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct GateTally {
    total: usize,
    moved_too_early: usize,
    false_negative: usize,
}

impl GateTally {
    fn record(&mut self, label: OutcomeLabel) {
        self.total += 1;
        match label {
            OutcomeLabel::MovedTooEarly => self.moved_too_early += 1,
            OutcomeLabel::FalseNegative => self.false_negative += 1,
            OutcomeLabel::TruePositive | OutcomeLabel::TrueNegative => {}
        }
    }

    fn rate(&self, count: usize) -> f64 {
        count as f64 / self.total as f64
    }
}

/// Four decimals, ties to even.
fn round4(rate: f64) -> f64 {
    (rate * 10_000.0).round_ties_even() / 10_000.0
}

fn proposal(
    gate_id: &str,
    recommendation_type: RecommendationType,
    direction: Direction,
    rationale: &str,
    rate: f64,
) -> CalibrationProposal {
    CalibrationProposal {
        gate_id: gate_id.to_string(),
        recommendation_type,
        direction,
        rationale: rationale.to_string(),
        confidence: round4(rate),
        auto_apply: false,
    }
}

/// Aggregate labeled attempts per gate and propose adjustments.
///
/// Gates with fewer than `policy.min_samples` rows are skipped. Output is
/// sorted by `(gate_id, recommendation_type, direction, rationale)` and never
/// marked for automatic application.
pub fn generate_calibration_proposals(
    evaluations: &[AttemptOutcomeEvaluation],
    policy: &CalibrationPolicy,
) -> CalibrationResult<Vec<CalibrationProposal>> {
    policy.validate()?;

    let mut by_gate: BTreeMap<&str, GateTally> = BTreeMap::new();
    for evaluation in evaluations {
        by_gate
            .entry(evaluation.gate_id.as_str())
            .or_default()
            .record(evaluation.label);
    }

    let mut proposals = Vec::new();
    for (gate_id, tally) in by_gate {
        if tally.total < policy.min_samples {
            debug!(gate_id = %gate_id, samples = tally.total, "not enough samples");
            continue;
        }

        let fp_rate = tally.rate(tally.moved_too_early);
        let fn_rate = tally.rate(tally.false_negative);
        debug!(gate_id = %gate_id, fp_rate, fn_rate, "gate rates");

        if fp_rate >= policy.moved_too_early_rate {
            proposals.push(proposal(
                gate_id,
                RecommendationType::ThresholdAdjustment,
                Direction::Increase,
                "high moved_too_early rate",
                fp_rate,
            ));
            proposals.push(proposal(
                gate_id,
                RecommendationType::CooldownAdjustment,
                Direction::Increase,
                "repeated early transitions in window",
                fp_rate,
            ));
        }
        if fn_rate >= policy.false_negative_rate {
            proposals.push(proposal(
                gate_id,
                RecommendationType::ThresholdAdjustment,
                Direction::Decrease,
                "high false_negative rate",
                fn_rate,
            ));
        }
    }

    proposals.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    Ok(proposals)
}
