//! Property tests for the decision engine and applier.

use chrono::{DateTime, Duration, TimeZone, Utc};
use metaspn_gates_engine::{apply_decisions, evaluate_gates, ApplyOptions};
use metaspn_gates_types::{
    ComparisonOp, CooldownPolicy, EntityState, GateConfig, HardRequirement, Predicate,
    SoftThreshold, StateMachineConfig,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap()
}

/// One gate with `n` soft thresholds `s0..sn`, each `scores.sI >= 0.5`.
fn quorum_config(n: usize, quorum: usize) -> StateMachineConfig {
    let mut gate = GateConfig::new("g.quorum", "1", "candidate", "qualified").with_min_soft_passed(quorum);
    for i in 0..n {
        gate = gate.with_soft_threshold(SoftThreshold::new(
            format!("st.{i}"),
            Predicate::new(format!("scores.s{i}"), ComparisonOp::Gte).with_value(0.5),
        ));
    }
    StateMachineConfig::new("sm.v1", vec![gate])
}

fn scores(passing: &[bool]) -> Value {
    let mut map = Map::new();
    for (i, pass) in passing.iter().enumerate() {
        map.insert(format!("s{i}"), json!(if *pass { 0.9 } else { 0.1 }));
    }
    json!({"scores": map})
}

fn qualify_config() -> StateMachineConfig {
    StateMachineConfig::new(
        "sm.v1",
        vec![
            GateConfig::new("g.qualify.a", "1", "candidate", "qualified")
                .with_hard_requirement(HardRequirement::new(
                    "hr.followers",
                    Predicate::new("social.followers", ComparisonOp::Gte).with_value(1000),
                ))
                .with_soft_threshold(SoftThreshold::new(
                    "st.quality",
                    Predicate::new("quality.score", ComparisonOp::Gte).with_value(0.7),
                ))
                .with_cooldown(3600, CooldownPolicy::Attempt)
                .with_task("task.review"),
            GateConfig::new("g.qualify.b", "1", "candidate", "rejected").with_hard_requirement(
                HardRequirement::new(
                    "hr.spam",
                    Predicate::new("flags.spam", ComparisonOp::Eq).with_value(true),
                ),
            ),
        ],
    )
}

fn features_strategy() -> impl Strategy<Value = Value> {
    (0u64..3000, 0.0f64..1.0, any::<bool>()).prop_map(|(followers, score, spam)| {
        json!({
            "social": {"followers": followers},
            "quality": {"score": score},
            "flags": {"spam": spam}
        })
    })
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(features in features_strategy(), offset in 0i64..86_400) {
        let now = base_time() + Duration::seconds(offset);
        let entity = EntityState::new("candidate").with_entity_id("ent-1");

        let first = evaluate_gates(&qualify_config(), &entity, &features, now).unwrap();
        let second = evaluate_gates(&qualify_config(), &entity, &features, now).unwrap();

        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn soft_stage_passes_iff_quorum_met(
        passing in proptest::collection::vec(any::<bool>(), 1..6),
        quorum_seed in 0usize..6,
    ) {
        let quorum = quorum_seed % (passing.len() + 1);
        let config = quorum_config(passing.len(), quorum);
        let satisfied = passing.iter().filter(|p| **p).count();

        let decisions = evaluate_gates(&config, &EntityState::new("candidate"), &scores(&passing), base_time()).unwrap();
        prop_assert_eq!(decisions.len(), 1);
        prop_assert_eq!(decisions[0].passed, satisfied >= quorum);
        prop_assert_eq!(decisions[0].soft_passed, Some(satisfied));
        if !decisions[0].passed {
            prop_assert_eq!(decisions[0].reason.as_deref(), Some("soft_threshold_failed"));
        }
    }

    #[test]
    fn override_never_escalates(features in features_strategy(), manual in "[a-z_]{1,16}") {
        let plain = EntityState::new("candidate");
        let overridden = plain.clone()
            .with_failure_override("g.qualify.a", manual.clone())
            .with_failure_override("g.qualify.b", manual.clone());

        let baseline = evaluate_gates(&qualify_config(), &plain, &features, base_time()).unwrap();
        let relabeled = evaluate_gates(&qualify_config(), &overridden, &features, base_time()).unwrap();

        prop_assert_eq!(baseline.len(), relabeled.len());
        for (before, after) in baseline.iter().zip(&relabeled) {
            prop_assert_eq!(before.passed, after.passed);
            prop_assert_eq!(&before.failed_requirement_id, &after.failed_requirement_id);
            if after.passed {
                prop_assert_eq!(after.reason.as_deref(), None);
            } else {
                prop_assert_eq!(after.reason.as_deref(), Some(manual.as_str()));
            }
        }
    }

    #[test]
    fn cooldown_blocks_inside_window(elapsed in 0i64..7200, features in features_strategy()) {
        let entity = EntityState::new("candidate")
            .with_cooldown("g.qualify.a", base_time());
        let now = base_time() + Duration::seconds(elapsed);

        let decisions = evaluate_gates(&qualify_config(), &entity, &features, now).unwrap();
        let gate = decisions.iter().find(|d| d.gate_id == "g.qualify.a").unwrap();

        prop_assert_eq!(gate.cooldown_active, elapsed < 3600);
        if gate.cooldown_active {
            prop_assert!(!gate.passed);
            prop_assert_eq!(gate.reason.as_deref(), Some("cooldown_active"));
            prop_assert_eq!(gate.failed_requirement_id.as_deref(), None);
            prop_assert_eq!(gate.soft_passed, None);
        }
    }

    #[test]
    fn applying_equal_copies_is_idempotent(features in features_strategy()) {
        let entity = EntityState::new("candidate").with_entity_id("ent-1");
        let copy = entity.clone();
        let decisions = evaluate_gates(&qualify_config(), &entity, &features, base_time()).unwrap();
        let options = ApplyOptions::new().with_caused_by("sig-prop");

        let (a_state, a_emissions) = apply_decisions(&entity, &decisions, &options).unwrap();
        let (b_state, b_emissions) = apply_decisions(&copy, &decisions, &options).unwrap();

        prop_assert_eq!(&a_state, &b_state);
        prop_assert_eq!(&a_emissions, &b_emissions);
        prop_assert_eq!(&entity, &copy);
        prop_assert_eq!(a_state.gate_attempts.len(), decisions.len());
    }
}
