//! Pluggable schema backends.
//!
//! A backend can take part in configuration handling in two ways, each
//! advertised through a capability check:
//!
//! - **validate**: normalize or reject an already-decoded document before
//!   gates are built;
//! - **parse**: turn raw file contents into a document, e.g. for formats
//!   other than JSON.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

/// Failure reported by a backend hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// File contents handed to [`SchemaBackend::parse`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigSource<'a> {
    pub raw: &'a str,
    /// The contents decoded as a JSON object, when that succeeded.
    pub decoded: Option<&'a Value>,
    pub path: &'a Path,
}

pub trait SchemaBackend: Send + Sync {
    fn name(&self) -> &str;

    fn can_validate(&self) -> bool {
        false
    }

    fn can_parse(&self) -> bool {
        false
    }

    /// Return the document to build gates from. A non-object result is
    /// ignored and the input document is used unchanged.
    fn validate(&self, payload: &Value) -> Result<Value, BackendError> {
        Ok(payload.clone())
    }

    fn parse(&self, source: ConfigSource<'_>) -> Result<Value, BackendError> {
        Err(BackendError::new(format!(
            "{} cannot parse {}",
            self.name(),
            source.path.display()
        )))
    }
}

/// Parse-only backend reading YAML documents.
///
/// JSON is a subset of YAML, so JSON files pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSchemaBackend;

impl SchemaBackend for YamlSchemaBackend {
    fn name(&self) -> &str {
        "yaml"
    }

    fn can_parse(&self) -> bool {
        true
    }

    fn parse(&self, source: ConfigSource<'_>) -> Result<Value, BackendError> {
        serde_yaml::from_str::<Value>(source.raw).map_err(|e| BackendError::new(e.to_string()))
    }
}
