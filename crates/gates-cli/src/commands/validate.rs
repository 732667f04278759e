//! Configuration validation

use std::path::Path;

use metaspn_gates_config::ConfigLoader;
use metaspn_gates_types::GateConfig;
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliResult;
use crate::output::{self, print_success, OutputFormat};

/// Table row for gate display
#[derive(Debug, Serialize, Tabled)]
struct GateRow {
    gate: String,
    version: String,
    track: String,
    transition: String,
    hard: usize,
    /// `required/total`
    soft: String,
    cooldown: String,
    tasks: String,
}

impl From<&GateConfig> for GateRow {
    fn from(gate: &GateConfig) -> Self {
        let cooldown = if gate.cooldown_seconds == 0 {
            "-".to_string()
        } else {
            format!(
                "{}s on {} ({})",
                gate.cooldown_seconds,
                gate.cooldown_on.as_str(),
                gate.cooldown_scope.as_str()
            )
        };
        Self {
            gate: gate.gate_id.clone(),
            version: gate.version.clone(),
            track: output::cell(gate.track.as_deref()),
            transition: format!("{} → {}", gate.from_state, gate.to_state),
            hard: gate.hard_requirements.len(),
            soft: format!("{}/{}", gate.required_soft_passes(), gate.soft_thresholds.len()),
            cooldown,
            tasks: gate.enqueue_tasks_on_pass.join(", "),
        }
    }
}

/// Execute the validate command
pub fn execute(loader: &ConfigLoader, path: &Path, format: OutputFormat) -> CliResult<()> {
    let config = loader.load(path)?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => output::print_document(&config, format),
        OutputFormat::Table => {
            print_success(&format!(
                "{} is valid: config_version {}, {} gate(s)",
                path.display(),
                config.config_version,
                config.len()
            ));
            let rows: Vec<GateRow> = config.gates().iter().map(GateRow::from).collect();
            output::print_table("Gates", rows, "No gates");
            Ok(())
        }
    }
}
