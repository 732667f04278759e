//! Both stages in one call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationResult;
use crate::labeling::evaluate_attempt_outcomes;
use crate::model::{AttemptOutcomeEvaluation, AttemptRecord, CalibrationProposal, OutcomeEvent};
use crate::policy::CalibrationPolicy;
use crate::proposals::generate_calibration_proposals;

/// Labeled attempts and the proposals derived from them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub evaluations: Vec<AttemptOutcomeEvaluation>,
    pub proposals: Vec<CalibrationProposal>,
}

/// Label `attempts` against `outcomes`, then aggregate under `policy`.
pub fn calibrate(
    attempts: &[AttemptRecord],
    outcomes: &[OutcomeEvent],
    outcome_window_seconds: i64,
    taxonomy: Option<&BTreeMap<String, String>>,
    policy: &CalibrationPolicy,
) -> CalibrationResult<CalibrationReport> {
    policy.validate()?;
    let evaluations = evaluate_attempt_outcomes(attempts, outcomes, outcome_window_seconds, taxonomy)?;
    let proposals = generate_calibration_proposals(&evaluations, policy)?;
    Ok(CalibrationReport {
        evaluations,
        proposals,
    })
}
