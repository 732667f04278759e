//! # metaspn-gates-config
//!
//! Turns configuration documents into validated
//! [`StateMachineConfig`](metaspn_gates_types::StateMachineConfig)s.
//!
//! ```text
//! file ──► SchemaBackend::parse? ──► JSON fallback ──► SchemaBackend::validate? ──► gates
//! ```
//!
//! Every malformed document is rejected with a [`ConfigError`] naming the
//! offending path; no partially-built configuration is ever returned.

#![deny(unsafe_code)]

pub mod backend;
pub mod error;
pub mod loader;
pub mod parse;

pub use backend::{BackendError, ConfigSource, SchemaBackend, YamlSchemaBackend};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_state_machine_config, parse_state_machine_config, ConfigLoader};
pub use parse::build_state_machine_config;
