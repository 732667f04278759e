//! Gate evaluation and application

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use metaspn_gates_config::ConfigLoader;
use metaspn_gates_engine::{
    apply_decisions, format_decision_trace, ApplyOptions, Evaluator, TaskEnvelopeBuilder, TraceRow,
    DEFAULT_TASK_PRIORITY,
};
use metaspn_gates_types::{timestamp, Emission, EntityState};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;
use tracing::debug;

use crate::commands::read_json;
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputFormat};

/// Arguments for `spn-gates evaluate`
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// State machine configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Entity state JSON file
    #[arg(short, long)]
    pub entity: PathBuf,

    /// Feature document JSON file
    #[arg(short, long)]
    pub features: PathBuf,

    /// Evaluation time (RFC 3339, naive values read as UTC). Defaults to now.
    #[arg(long)]
    pub now: Option<String>,

    /// Print trace rows instead of full decisions
    #[arg(long)]
    pub trace: bool,

    /// Apply the decisions and print the new entity state and emissions
    #[arg(long)]
    pub apply: bool,

    /// Upstream signal id recorded on transitions and emissions
    #[arg(long, requires = "apply")]
    pub caused_by: Option<String>,

    /// Attach task/emission envelopes to emissions
    #[arg(long, requires = "apply")]
    pub schema_envelopes: bool,

    /// Priority written into task envelopes
    #[arg(long, default_value_t = DEFAULT_TASK_PRIORITY)]
    pub priority: u32,
}

/// Table row for decision display
#[derive(Debug, Serialize, Tabled)]
struct DecisionRow {
    gate: String,
    transition: String,
    verdict: String,
    reason: String,
    failed: String,
    cooldown: String,
}

impl From<&TraceRow> for DecisionRow {
    fn from(row: &TraceRow) -> Self {
        Self {
            gate: row.gate_id.clone(),
            transition: format!("{} → {}", row.from_state, row.to_state),
            verdict: output::verdict(row.passed),
            reason: row.reason.clone(),
            failed: output::cell(row.failed_requirement_id.as_deref()),
            cooldown: if row.cooldown_active { "active" } else { "-" }.to_string(),
        }
    }
}

/// Table row for emission display
#[derive(Debug, Serialize, Tabled)]
struct EmissionRow {
    task: String,
    gate: String,
    entity: String,
    caused_by: String,
    envelope: String,
}

impl From<&Emission> for EmissionRow {
    fn from(emission: &Emission) -> Self {
        Self {
            task: emission.task_id.clone(),
            gate: emission.gate_id.clone(),
            entity: output::cell(emission.entity_id.as_deref()),
            caused_by: output::cell(emission.caused_by.as_deref()),
            envelope: if emission.schema.is_some() { "yes" } else { "-" }.to_string(),
        }
    }
}

/// JSON/YAML shape of an applied evaluation
#[derive(Debug, Serialize)]
struct Applied<'a> {
    entity_state: Value,
    emissions: &'a [Emission],
}

fn evaluation_time(raw: Option<&str>) -> CliResult<DateTime<Utc>> {
    match raw {
        Some(raw) => timestamp::parse_timestamp(raw)
            .map_err(|e| CliError::InvalidArgument(format!("--now {raw}: {e}"))),
        None => Ok(Utc::now()),
    }
}

/// Execute the evaluate command
pub fn execute(loader: &ConfigLoader, args: EvaluateArgs, format: OutputFormat) -> CliResult<()> {
    let config = loader.load(&args.config)?;
    let entity = EntityState::from_value(read_json::<Value>(&args.entity)?)?;
    let features: Value = read_json(&args.features)?;
    let now = evaluation_time(args.now.as_deref())?;
    debug!(now = %now, gates = config.len(), "evaluating");

    let decisions = Evaluator::new().evaluate(&config, &entity, &features, now)?;
    let trace = format_decision_trace(&decisions);

    if !args.apply {
        return match format {
            OutputFormat::Table => {
                print_decisions(&trace);
                Ok(())
            }
            _ if args.trace => output::print_document(&trace, format),
            _ => output::print_document(&decisions, format),
        };
    }

    let mut options = ApplyOptions::new().with_default_task_priority(args.priority);
    if let Some(caused_by) = args.caused_by {
        options = options.with_caused_by(caused_by);
    }
    if args.schema_envelopes {
        options = options.with_envelopes(Arc::new(TaskEnvelopeBuilder));
    }
    let (next, emissions) = apply_decisions(&entity, &decisions, &options)?;

    match format {
        OutputFormat::Table => {
            print_decisions(&trace);
            println!();
            println!(
                "{}: {} → {}",
                "State".bold(),
                output::cell(entity.state.as_deref()),
                output::cell(next.state.as_deref()).green()
            );
            println!();
            let rows: Vec<EmissionRow> = emissions.iter().map(EmissionRow::from).collect();
            output::print_table("Emissions", rows, "No tasks enqueued");
            Ok(())
        }
        _ => output::print_document(
            &Applied {
                entity_state: next.to_value()?,
                emissions: &emissions,
            },
            format,
        ),
    }
}

fn print_decisions(trace: &[TraceRow]) {
    let rows: Vec<DecisionRow> = trace.iter().map(DecisionRow::from).collect();
    output::print_table("Gate Decisions", rows, "No gate matches the entity's state and track");
}
