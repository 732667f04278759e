//! Property tests for outcome labeling and proposal generation.

use chrono::{DateTime, Duration, TimeZone, Utc};
use metaspn_gates_calibration::{
    evaluate_attempt_outcomes, generate_calibration_proposals, AttemptRecord, CalibrationPolicy,
    OutcomeEvent,
};
use proptest::prelude::*;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 6, 12, 0, 0).unwrap()
}

fn attempts_strategy() -> impl Strategy<Value = Vec<AttemptRecord>> {
    proptest::collection::vec((0usize..3, 0i64..3600, any::<bool>()), 0..24).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (gate, offset, passed))| AttemptRecord {
                attempt_id: format!("a{i:02}"),
                gate_id: format!("g{gate}"),
                attempted_at: base_time() + Duration::seconds(offset),
                passed,
            })
            .collect()
    })
}

fn outcomes_strategy() -> impl Strategy<Value = Vec<OutcomeEvent>> {
    proptest::collection::vec((0i64..4000, any::<bool>()), 0..12).prop_map(|raw| {
        raw.into_iter()
            .map(|(offset, success)| OutcomeEvent {
                timestamp: base_time() + Duration::seconds(offset),
                success,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn input_order_does_not_matter(
        attempts in attempts_strategy(),
        outcomes in outcomes_strategy(),
        window in 0i64..900,
    ) {
        let mut reversed_attempts = attempts.clone();
        reversed_attempts.reverse();
        let mut reversed_outcomes = outcomes.clone();
        reversed_outcomes.reverse();

        let forward = evaluate_attempt_outcomes(&attempts, &outcomes, window, None).unwrap();
        let backward = evaluate_attempt_outcomes(&reversed_attempts, &reversed_outcomes, window, None).unwrap();
        prop_assert_eq!(&forward, &backward);

        let policy = CalibrationPolicy::default();
        prop_assert_eq!(
            generate_calibration_proposals(&forward, &policy).unwrap(),
            generate_calibration_proposals(&backward, &policy).unwrap()
        );
    }

    #[test]
    fn proposals_respect_min_samples(
        attempts in attempts_strategy(),
        outcomes in outcomes_strategy(),
        min_samples in 1usize..10,
    ) {
        let rows = evaluate_attempt_outcomes(&attempts, &outcomes, 300, None).unwrap();
        let policy = CalibrationPolicy::default().with_min_samples(min_samples);
        let proposals = generate_calibration_proposals(&rows, &policy).unwrap();

        for proposal in &proposals {
            let samples = rows.iter().filter(|r| r.gate_id == proposal.gate_id).count();
            prop_assert!(samples >= min_samples);
            prop_assert!(!proposal.auto_apply);
            prop_assert!((0.0..=1.0).contains(&proposal.confidence));
        }
    }

    #[test]
    fn every_attempt_gets_one_row(attempts in attempts_strategy(), outcomes in outcomes_strategy()) {
        let rows = evaluate_attempt_outcomes(&attempts, &outcomes, 60, None).unwrap();
        prop_assert_eq!(rows.len(), attempts.len());
        for row in &rows {
            prop_assert_eq!(row.failure_reason.is_some(), !row.label.is_correct());
            prop_assert!(row.outcomes_count <= outcomes.len());
        }
    }
}
