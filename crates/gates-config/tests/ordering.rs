use metaspn_gates_config::parse_state_machine_config;
use proptest::prelude::*;
use serde_json::{json, Value};

fn gate(gate_id: &str, track: Option<&str>, from: &str) -> Value {
    let mut gate = json!({"gate_id": gate_id, "version": "1", "from": from, "to": "next"});
    if let Some(track) = track {
        gate["track"] = json!(track);
    }
    gate
}

fn gates() -> Vec<Value> {
    vec![
        gate("g.c", Some("B"), "SEEN"),
        gate("g.a", Some("B"), "SEEN"),
        gate("g.b", Some("A"), "OBSERVED"),
        gate("g.d", None, "SEEN"),
        gate("g.e", None, "OBSERVED"),
        gate("g.f", Some("A"), "CANDIDATE"),
    ]
}

proptest! {
    #[test]
    fn gate_order_independent_of_input_order(shuffled in Just(gates()).prop_shuffle()) {
        let config = parse_state_machine_config(&json!({
            "config_version": "sm.v1",
            "gates": shuffled,
        }))
        .unwrap();

        let ids: Vec<_> = config.gates().iter().map(|g| g.gate_id.as_str()).collect();
        prop_assert_eq!(ids, vec!["g.e", "g.d", "g.f", "g.b", "g.a", "g.c"]);
    }
}
