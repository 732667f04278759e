use std::fmt;
use std::path::Path;
use std::sync::Arc;

use metaspn_gates_types::StateMachineConfig;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{ConfigSource, SchemaBackend};
use crate::error::{ConfigError, ConfigResult};
use crate::parse::build_state_machine_config;

/// Loads state-machine configurations, optionally through a schema backend.
///
/// Without a backend only JSON documents are understood.
#[derive(Clone, Default)]
pub struct ConfigLoader {
    backend: Option<Arc<dyn SchemaBackend>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: Arc<dyn SchemaBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn backend(&self) -> Option<&dyn SchemaBackend> {
        self.backend.as_deref()
    }

    /// A backend is plugged in.
    pub fn backend_available(&self) -> bool {
        self.backend.is_some()
    }

    /// The plugged backend offers both the parse and validate hooks.
    pub fn contract_available(&self) -> bool {
        self.backend
            .as_deref()
            .is_some_and(|b| b.can_parse() && b.can_validate())
    }

    /// Build a configuration from a decoded document.
    ///
    /// A validating backend sees the document first and may replace it.
    pub fn parse(&self, payload: &Value) -> ConfigResult<StateMachineConfig> {
        let validated;
        let mut payload = payload;

        if let Some(backend) = self.backend.as_deref().filter(|b| b.can_validate()) {
            let result = backend
                .validate(payload)
                .map_err(|e| ConfigError::SchemaValidation {
                    backend: backend.name().to_string(),
                    message: e.to_string(),
                })?;
            if result.is_object() {
                validated = result;
                payload = &validated;
            } else {
                debug!(backend = backend.name(), "validator returned a non-object, keeping input document");
            }
        }

        let config = build_state_machine_config(payload)?;
        debug!(
            config_version = %config.config_version,
            gates = config.len(),
            "parsed state machine config"
        );
        Ok(config)
    }

    /// Read a configuration file.
    ///
    /// A parsing backend is offered the raw contents first. Its result is
    /// only accepted when it carries both `config_version` and `gates`;
    /// otherwise the loader falls back to the contents decoded as JSON.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<StateMachineConfig> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let decoded = serde_json::from_str::<Value>(&raw).ok();
        let decoded_object = decoded.as_ref().filter(|v| v.is_object());

        let from_backend = self.parse_with_backend(&raw, decoded_object, path);

        match (from_backend, decoded) {
            (Some(payload), _) => self.parse(&payload),
            (None, Some(payload)) if payload.is_object() => self.parse(&payload),
            (None, Some(_)) => Err(ConfigError::NotAnObject),
            (None, None) => Err(ConfigError::Undecodable {
                path: path.to_path_buf(),
            }),
        }
    }

    fn parse_with_backend(&self, raw: &str, decoded: Option<&Value>, path: &Path) -> Option<Value> {
        let backend = self.backend.as_deref().filter(|b| b.can_parse())?;
        let source = ConfigSource { raw, decoded, path };

        match backend.parse(source) {
            Ok(payload) if looks_like_gate_config(&payload) => Some(payload),
            Ok(_) => {
                warn!(
                    backend = backend.name(),
                    path = %path.display(),
                    "backend result lacks config_version/gates, falling back to JSON"
                );
                None
            }
            Err(e) => {
                warn!(
                    backend = backend.name(),
                    path = %path.display(),
                    error = %e,
                    "backend parse failed, falling back to JSON"
                );
                None
            }
        }
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("backend", &self.backend.as_deref().map(|b| b.name()))
            .finish()
    }
}

fn looks_like_gate_config(payload: &Value) -> bool {
    payload
        .as_object()
        .is_some_and(|map| map.contains_key("config_version") && map.contains_key("gates"))
}

/// Parse a decoded document with no schema backend.
pub fn parse_state_machine_config(payload: &Value) -> ConfigResult<StateMachineConfig> {
    ConfigLoader::new().parse(payload)
}

/// Load a JSON configuration file with no schema backend.
pub fn load_state_machine_config(path: impl AsRef<Path>) -> ConfigResult<StateMachineConfig> {
    ConfigLoader::new().load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, YamlSchemaBackend};
    use serde_json::json;

    struct Rejecting;

    impl SchemaBackend for Rejecting {
        fn name(&self) -> &str {
            "rejecting"
        }
        fn can_validate(&self) -> bool {
            true
        }
        fn validate(&self, _payload: &Value) -> Result<Value, BackendError> {
            Err(BackendError::new("gates[0].version: not semver"))
        }
    }

    struct Renaming;

    impl SchemaBackend for Renaming {
        fn name(&self) -> &str {
            "renaming"
        }
        fn can_validate(&self) -> bool {
            true
        }
        fn validate(&self, payload: &Value) -> Result<Value, BackendError> {
            let mut out = payload.clone();
            out["config_version"] = json!("normalized");
            Ok(out)
        }
    }

    fn doc() -> Value {
        json!({
            "config_version": "sm.v1",
            "gates": [{"gate_id": "g", "version": "1", "from": "a", "to": "b"}]
        })
    }

    #[test]
    fn capability_reporting() {
        let bare = ConfigLoader::new();
        assert!(!bare.backend_available());
        assert!(!bare.contract_available());

        let yaml = ConfigLoader::new().with_backend(Arc::new(YamlSchemaBackend));
        assert!(yaml.backend_available());
        assert!(!yaml.contract_available());
    }

    #[test]
    fn validation_rejection_becomes_config_error() {
        let loader = ConfigLoader::new().with_backend(Arc::new(Rejecting));
        let err = loader.parse(&doc()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "rejecting validation failed: gates[0].version: not semver"
        );
    }

    #[test]
    fn validator_output_replaces_payload() {
        let loader = ConfigLoader::new().with_backend(Arc::new(Renaming));
        let config = loader.parse(&doc()).unwrap();
        assert_eq!(config.config_version, "normalized");
    }

    #[test]
    fn debug_shows_backend_name() {
        let loader = ConfigLoader::new().with_backend(Arc::new(YamlSchemaBackend));
        assert_eq!(format!("{loader:?}"), "ConfigLoader { backend: Some(\"yaml\") }");
    }
}
