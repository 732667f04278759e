//! # metaspn-gates-calibration
//!
//! Hindsight scoring of gate decisions.
//!
//! ```text
//! AttemptRecord[] ─┐
//!                  ├─► evaluate_attempt_outcomes ─► AttemptOutcomeEvaluation[]
//! OutcomeEvent[] ──┘                                        │
//!                                                           ▼
//!                               generate_calibration_proposals ─► CalibrationProposal[]
//! ```
//!
//! This crate has NO authority over gate configuration. It only produces
//! recommendations; every proposal carries `auto_apply = false` and applying
//! one is left to a human.

#![deny(unsafe_code)]

pub mod attempts;
pub mod error;
pub mod labeling;
pub mod model;
pub mod policy;
pub mod proposals;
pub mod report;

pub use attempts::{attempts_from_entity_state, ANONYMOUS_ENTITY};
pub use error::{CalibrationError, CalibrationResult};
pub use labeling::{classify_failure_reason, evaluate_attempt_outcomes, DEFAULT_FAILURE_REASON};
pub use model::{
    AttemptOutcomeEvaluation, AttemptRecord, CalibrationProposal, Direction, OutcomeEvent,
    OutcomeLabel, RecommendationType,
};
pub use policy::CalibrationPolicy;
pub use proposals::generate_calibration_proposals;
pub use report::{calibrate, CalibrationReport};
