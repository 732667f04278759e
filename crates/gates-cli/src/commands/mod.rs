//! CLI command implementations

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{CliError, CliResult};

pub mod calibrate;
pub mod evaluate;
pub mod validate;

/// Read and decode a JSON document.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}
