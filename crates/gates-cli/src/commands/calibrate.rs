//! Outcome calibration

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use metaspn_gates_calibration::{
    attempts_from_entity_state, calibrate, AttemptOutcomeEvaluation, AttemptRecord,
    CalibrationPolicy, CalibrationProposal, OutcomeEvent,
};
use metaspn_gates_types::EntityState;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::commands::read_json;
use crate::error::CliResult;
use crate::output::{self, OutputFormat};

/// Arguments for `spn-gates calibrate`
#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// JSON array of attempt records
    #[arg(short, long, required_unless_present = "entity", conflicts_with = "entity")]
    pub attempts: Option<PathBuf>,

    /// Entity state JSON whose gate_attempts log supplies the attempts
    #[arg(short, long)]
    pub entity: Option<PathBuf>,

    /// JSON array of outcome events
    #[arg(long)]
    pub outcomes: PathBuf,

    /// Outcome window in seconds
    #[arg(short, long, allow_negative_numbers = true)]
    pub window: i64,

    /// Minimum labeled attempts per gate before proposing anything
    #[arg(long, default_value_t = 3)]
    pub min_samples: usize,

    /// moved_too_early rate that triggers an increase
    #[arg(long)]
    pub moved_too_early_rate: Option<f64>,

    /// false_negative rate that triggers a decrease
    #[arg(long)]
    pub false_negative_rate: Option<f64>,

    /// JSON object mapping labels to failure reasons
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,
}

impl CalibrateArgs {
    fn policy(&self) -> CalibrationPolicy {
        let mut policy = CalibrationPolicy::default().with_min_samples(self.min_samples);
        if let Some(rate) = self.moved_too_early_rate {
            policy = policy.with_moved_too_early_rate(rate);
        }
        if let Some(rate) = self.false_negative_rate {
            policy = policy.with_false_negative_rate(rate);
        }
        policy
    }

    fn attempts(&self) -> CliResult<Vec<AttemptRecord>> {
        match (&self.attempts, &self.entity) {
            (Some(path), _) => read_json(path),
            (None, Some(path)) => {
                let entity = EntityState::from_value(read_json::<Value>(path)?)?;
                Ok(attempts_from_entity_state(&entity))
            }
            (None, None) => Ok(Vec::new()),
        }
    }
}

/// Table row for labeled attempts
#[derive(Debug, Serialize, Tabled)]
struct EvaluationRow {
    attempt: String,
    gate: String,
    attempted_at: String,
    label: String,
    outcomes: usize,
    reason: String,
}

impl From<&AttemptOutcomeEvaluation> for EvaluationRow {
    fn from(row: &AttemptOutcomeEvaluation) -> Self {
        Self {
            attempt: row.attempt_id.clone(),
            gate: row.gate_id.clone(),
            attempted_at: row.attempted_at.to_rfc3339(),
            label: row.label.to_string(),
            outcomes: row.outcomes_count,
            reason: output::cell(row.failure_reason.as_deref()),
        }
    }
}

/// Table row for proposals
#[derive(Debug, Serialize, Tabled)]
struct ProposalRow {
    gate: String,
    recommendation: String,
    direction: String,
    confidence: String,
    rationale: String,
}

impl From<&CalibrationProposal> for ProposalRow {
    fn from(proposal: &CalibrationProposal) -> Self {
        Self {
            gate: proposal.gate_id.clone(),
            recommendation: proposal.recommendation_type.to_string(),
            direction: proposal.direction.to_string(),
            confidence: format!("{:.4}", proposal.confidence),
            rationale: proposal.rationale.clone(),
        }
    }
}

/// Execute the calibrate command
pub fn execute(args: CalibrateArgs, format: OutputFormat) -> CliResult<()> {
    let attempts = args.attempts()?;
    let outcomes: Vec<OutcomeEvent> = read_json(&args.outcomes)?;
    let taxonomy: Option<BTreeMap<String, String>> =
        args.taxonomy.as_deref().map(read_json::<BTreeMap<String, String>>).transpose()?;

    let report = calibrate(
        &attempts,
        &outcomes,
        args.window,
        taxonomy.as_ref(),
        &args.policy(),
    )?;

    match format {
        OutputFormat::Table => {
            let rows: Vec<EvaluationRow> = report.evaluations.iter().map(EvaluationRow::from).collect();
            output::print_table("Labeled Attempts", rows, "No attempts");
            println!();
            let rows: Vec<ProposalRow> = report.proposals.iter().map(ProposalRow::from).collect();
            output::print_table("Proposals", rows, "No proposals");
            println!();
            println!(
                "{}: proposals are advisory and never applied automatically",
                "Note".bold()
            );
            Ok(())
        }
        _ => output::print_document(&report, format),
    }
}
