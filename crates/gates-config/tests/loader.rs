use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use metaspn_gates_config::{
    load_state_machine_config, BackendError, ConfigError, ConfigLoader, ConfigSource,
    SchemaBackend, YamlSchemaBackend,
};
use metaspn_gates_types::{ComparisonOp, CooldownPolicy, CooldownScope};
use serde_json::{json, Value};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn write_temp(name: &str, contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

const MINIMAL: &str =
    r#"{"config_version":"sm.v1","gates":[{"gate_id":"g1","version":"1","from":"a","to":"b"}]}"#;

/// Backend that records what it was handed and returns a fixed document.
struct Recording {
    result: Result<Value, BackendError>,
    saw_decoded: Mutex<Option<bool>>,
}

impl Recording {
    fn returning(result: Result<Value, BackendError>) -> Self {
        Self {
            result,
            saw_decoded: Mutex::new(None),
        }
    }
}

impl SchemaBackend for Recording {
    fn name(&self) -> &str {
        "recording"
    }

    fn can_parse(&self) -> bool {
        true
    }

    fn can_validate(&self) -> bool {
        true
    }

    fn parse(&self, source: ConfigSource<'_>) -> Result<Value, BackendError> {
        *self.saw_decoded.lock().unwrap() = Some(source.decoded.is_some());
        self.result.clone()
    }

    fn validate(&self, payload: &Value) -> Result<Value, BackendError> {
        let mut out = payload.clone();
        out["config_version"] = json!(format!(
            "{}.validated",
            payload["config_version"].as_str().unwrap_or_default()
        ));
        Ok(out)
    }
}

#[test]
fn loads_m0_fixture_in_sorted_order() {
    let config = load_state_machine_config(fixture("m0_state_machine_config.json")).unwrap();
    assert_eq!(config.config_version, "m0.v1");
    let ids: Vec<_> = config.gates().iter().map(|g| g.gate_id.as_str()).collect();
    assert_eq!(ids, vec!["m0.observed_to_profiled", "m0.seen_to_observed"]);

    let profiled = config.gate("m0.observed_to_profiled").unwrap();
    assert_eq!(profiled.cooldown_on, CooldownPolicy::Attempt);
    assert_eq!(profiled.required_soft_passes(), 1);
    assert_eq!(profiled.enqueue_tasks_on_pass, vec!["task.build_profile"]);
}

#[test]
fn json_content_loads_regardless_of_extension() {
    let (_dir, path) = write_temp("config.yaml", MINIMAL);
    let config = load_state_machine_config(&path).unwrap();
    assert_eq!(config.config_version, "sm.v1");
    assert_eq!(config.gates()[0].gate_id, "g1");
}

#[test]
fn yaml_requires_a_backend() {
    let path = fixture("qualify_state_machine_config.yaml");
    let err = load_state_machine_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Undecodable { .. }));

    let config = ConfigLoader::new()
        .with_backend(Arc::new(YamlSchemaBackend))
        .load(&path)
        .unwrap();
    assert_eq!(config.config_version, "qualify.v3");

    let ids: Vec<_> = config.gates().iter().map(|g| g.gate_id.as_str()).collect();
    assert_eq!(ids, vec!["g.qualify.a", "g.qualify.b"]);

    let b = config.gate("g.qualify.b").unwrap();
    assert_eq!(b.cooldown_scope, CooldownScope::Channel);
    assert_eq!(b.soft_thresholds[1].predicate.op, ComparisonOp::In);
    assert_eq!(b.soft_thresholds[1].predicate.value, Some(json!(["emea", "na"])));

    let a = config.gate("g.qualify.a").unwrap();
    assert_eq!(a.suppression_field.as_deref(), Some("flags.do_not_contact"));
    assert_eq!(a.failure_reason_for("hr.followers"), "insufficient_reach");
}

#[test]
fn backend_parse_result_is_validated() {
    let backend = Arc::new(Recording::returning(Ok(json!({
        "config_version": "sm.v2",
        "gates": [{"gate_id": "g1", "version": "2", "from": "start", "to": "next"}]
    }))));
    let loader = ConfigLoader::new().with_backend(backend.clone());
    assert!(loader.contract_available());

    let (_dir, path) = write_temp("config.json", MINIMAL);
    let config = loader.load(&path).unwrap();
    assert_eq!(config.config_version, "sm.v2.validated");
    assert_eq!(config.gates()[0].version, "2");
    assert_eq!(*backend.saw_decoded.lock().unwrap(), Some(true));
}

#[test]
fn failing_backend_falls_back_to_json() {
    let backend = Arc::new(Recording::returning(Err(BackendError::new("expects another shape"))));
    let loader = ConfigLoader::new().with_backend(backend);

    let config = loader.load(fixture("m0_state_machine_config.json")).unwrap();
    assert_eq!(config.config_version, "m0.v1.validated");
    assert_eq!(config.len(), 2);
}

#[test]
fn wrong_shaped_backend_result_is_discarded() {
    let backend = Arc::new(Recording::returning(Ok(json!({"schema": "gates"}))));
    let loader = ConfigLoader::new().with_backend(backend);

    let (_dir, path) = write_temp("config.json", MINIMAL);
    let config = loader.load(&path).unwrap();
    assert_eq!(config.config_version, "sm.v1.validated");
}

#[test]
fn undecodable_file_without_backend_result() {
    let backend = Arc::new(Recording::returning(Err(BackendError::new("nope"))));
    let (_dir, path) = write_temp("config.toml", "config_version = 'x'");
    let err = ConfigLoader::new().with_backend(backend).load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Undecodable { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn top_level_must_be_an_object() {
    let (_dir, path) = write_temp("config.json", "[1, 2, 3]");
    let err = load_state_machine_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotAnObject));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_state_machine_config(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn duplicate_gate_ids_rejected_from_file() {
    let err = load_state_machine_config(fixture("duplicate_gate_ids.json")).unwrap_err();
    assert_eq!(err.to_string(), "duplicate gate_id: g1");
}
