//! Stage A: label each attempt against the outcomes that followed it.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{CalibrationError, CalibrationResult};
use crate::model::{AttemptOutcomeEvaluation, AttemptRecord, OutcomeEvent, OutcomeLabel};

pub const DEFAULT_FAILURE_REASON: &str = "unknown_failure";

/// Failure reason for a label.
///
/// Correct labels have none. Incorrect labels take the taxonomy entry keyed
/// by the label name, falling back to `default_reason`.
pub fn classify_failure_reason(
    label: OutcomeLabel,
    taxonomy: Option<&BTreeMap<String, String>>,
    default_reason: &str,
) -> Option<String> {
    if label.is_correct() {
        return None;
    }
    let reason = taxonomy
        .and_then(|map| map.get(label.as_str()))
        .map(String::as_str)
        .unwrap_or(default_reason);
    Some(reason.to_string())
}

/// Label every attempt.
///
/// An outcome counts for an attempt when its timestamp lies in the closed
/// window `[attempted_at, attempted_at + outcome_window_seconds]`. Rows are
/// returned sorted by `(gate_id, attempted_at, attempt_id)`.
pub fn evaluate_attempt_outcomes(
    attempts: &[AttemptRecord],
    outcomes: &[OutcomeEvent],
    outcome_window_seconds: i64,
    taxonomy: Option<&BTreeMap<String, String>>,
) -> CalibrationResult<Vec<AttemptOutcomeEvaluation>> {
    if outcome_window_seconds < 0 {
        return Err(CalibrationError::NegativeWindow(outcome_window_seconds));
    }

    let mut timeline: Vec<(DateTime<Utc>, bool)> =
        outcomes.iter().map(|o| (o.timestamp, o.success)).collect();
    timeline.sort_by_key(|(ts, _)| *ts);

    let mut rows: Vec<AttemptOutcomeEvaluation> = attempts
        .iter()
        .map(|attempt| {
            let start = attempt.attempted_at;
            let end = TimeDelta::try_seconds(outcome_window_seconds)
                .and_then(|window| start.checked_add_signed(window))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);

            let first = timeline.partition_point(|(ts, _)| *ts < start);
            let last = timeline.partition_point(|(ts, _)| *ts <= end);
            let in_window = &timeline[first..last.max(first)];

            let success_observed = in_window.iter().any(|(_, success)| *success);
            let label = OutcomeLabel::classify(attempt.passed, success_observed);

            AttemptOutcomeEvaluation {
                attempt_id: attempt.attempt_id.clone(),
                gate_id: attempt.gate_id.clone(),
                label,
                success_observed,
                outcomes_count: in_window.len(),
                failure_reason: classify_failure_reason(label, taxonomy, DEFAULT_FAILURE_REASON),
                attempted_at: start,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.gate_id, a.attempted_at, &a.attempt_id).cmp(&(&b.gate_id, b.attempted_at, &b.attempt_id))
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 6, 12, 0, 0).unwrap()
    }

    fn attempt(id: &str, gate: &str, at: DateTime<Utc>, passed: bool) -> AttemptRecord {
        AttemptRecord {
            attempt_id: id.to_string(),
            gate_id: gate.to_string(),
            attempted_at: at,
            passed,
        }
    }

    fn outcome(at: DateTime<Utc>, success: bool) -> OutcomeEvent {
        OutcomeEvent {
            timestamp: at,
            success,
        }
    }

    #[test]
    fn success_outside_window_means_moved_too_early() {
        let taxonomy = BTreeMap::from([("moved_too_early".to_string(), "window_miss".to_string())]);
        let rows = evaluate_attempt_outcomes(
            &[attempt("a1", "g1", noon(), true)],
            &[outcome(noon() + Duration::minutes(20), true)],
            300,
            Some(&taxonomy),
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, OutcomeLabel::MovedTooEarly);
        assert_eq!(rows[0].failure_reason.as_deref(), Some("window_miss"));
        assert_eq!(rows[0].outcomes_count, 0);
    }

    #[test]
    fn false_negative_and_moved_too_early() {
        let rows = evaluate_attempt_outcomes(
            &[
                attempt("a1", "g1", noon(), true),
                attempt("a2", "g1", noon() + Duration::minutes(1), false),
            ],
            &[
                outcome(noon() + Duration::seconds(20), false),
                outcome(noon() + Duration::seconds(75), true),
            ],
            30,
            None,
        )
        .unwrap();

        assert_eq!(rows[0].label, OutcomeLabel::MovedTooEarly);
        assert_eq!(rows[0].outcomes_count, 1);
        assert_eq!(rows[0].failure_reason.as_deref(), Some("unknown_failure"));
        assert_eq!(rows[1].label, OutcomeLabel::FalseNegative);
        assert!(rows[1].success_observed);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let rows = evaluate_attempt_outcomes(
            &[
                attempt("start", "g1", noon(), true),
                attempt("end", "g2", noon() - Duration::seconds(60), true),
            ],
            &[outcome(noon(), true)],
            60,
            None,
        )
        .unwrap();
        assert!(rows.iter().all(|r| r.label == OutcomeLabel::TruePositive));
        assert!(rows.iter().all(|r| r.failure_reason.is_none()));
    }

    #[test]
    fn outcomes_before_attempt_ignored() {
        let rows = evaluate_attempt_outcomes(
            &[attempt("a1", "g1", noon(), false)],
            &[outcome(noon() - Duration::seconds(1), true)],
            3600,
            None,
        )
        .unwrap();
        assert_eq!(rows[0].label, OutcomeLabel::TrueNegative);
    }

    #[test]
    fn rows_sorted_by_gate_time_and_id() {
        let rows = evaluate_attempt_outcomes(
            &[
                attempt("b", "g2", noon(), true),
                attempt("z", "g1", noon() + Duration::minutes(1), true),
                attempt("y", "g1", noon(), true),
                attempt("x", "g1", noon(), true),
            ],
            &[],
            0,
            None,
        )
        .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.attempt_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z", "b"]);
    }

    #[test]
    fn negative_window_rejected() {
        let err = evaluate_attempt_outcomes(&[], &[], -1, None).unwrap_err();
        assert_eq!(err, CalibrationError::NegativeWindow(-1));
    }

    #[test]
    fn classify_defaults() {
        let empty = BTreeMap::new();
        assert_eq!(classify_failure_reason(OutcomeLabel::TruePositive, Some(&empty), DEFAULT_FAILURE_REASON), None);
        assert_eq!(
            classify_failure_reason(OutcomeLabel::FalseNegative, Some(&empty), DEFAULT_FAILURE_REASON).as_deref(),
            Some("unknown_failure")
        );
        assert_eq!(
            classify_failure_reason(OutcomeLabel::FalseNegative, None, "missed").as_deref(),
            Some("missed")
        );
    }
}
