//! # metaspn-gates-engine
//!
//! Decision engine and state applier.
//!
//! ```text
//! StateMachineConfig ─┐
//! EntityState ────────┼─► Evaluator ─► Vec<GateDecision> ─► apply_decisions ─► (EntityState, Vec<Emission>)
//! features + now ─────┘
//! ```
//!
//! Both stages are pure: no clock reads, no I/O, and the caller's entity
//! state is never mutated.

#![deny(unsafe_code)]

pub mod applier;
pub mod cooldown;
pub mod envelope;
pub mod error;
pub mod evaluator;
pub mod path;
pub mod predicate;
pub mod trace;

pub use applier::{apply_decisions, apply_to_value, ApplyOptions};
pub use envelope::{
    EmissionEnvelope, EntityRef, EnvelopeBuilder, EnvelopeRequest, Task, TaskContext,
    TaskEnvelope, TaskEnvelopeBuilder, DEFAULT_TASK_PRIORITY, UNKNOWN_CAUSE,
};
pub use error::{ApplyError, ApplyResult, EngineError, EngineResult, Incomparable};
pub use evaluator::{evaluate_gates, Evaluator};
pub use trace::{format_decision_trace, TraceRow};
