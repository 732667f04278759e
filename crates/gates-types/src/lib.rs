//! # metaspn-gates-types
//!
//! Value types shared by every stage of the gate pipeline:
//!
//! - **Rule model**: [`GateConfig`] and [`StateMachineConfig`], immutable once
//!   parsed. Gates are kept in a deterministic `(track, from_state, gate_id)`
//!   order so evaluation order never depends on input file order.
//! - **Entity state**: [`EntityState`], the caller-owned record the engine
//!   reads and the applier returns an updated copy of.
//! - **Audit records**: [`TransitionAttempted`], [`GateDecision`],
//!   [`TransitionApplied`] and [`Emission`].
//!
//! The crate has no behavior beyond construction, lookups and shape checks.

#![deny(unsafe_code)]

pub mod decision;
pub mod emission;
pub mod entity;
pub mod error;
pub mod gate;
pub mod timestamp;

pub use decision::{reason, DecisionSnapshot, GateDecision, TransitionApplied, TransitionAttempted};
pub use emission::{Emission, EMISSION_KIND_TASK_ENQUEUED};
pub use entity::EntityState;
pub use error::{ContractError, UnknownVariant};
pub use gate::{
    ComparisonOp, CooldownPolicy, CooldownScope, GateConfig, HardRequirement, Predicate,
    PredicateSource, SoftThreshold, StateMachineConfig, DEFAULT_COOLDOWN_CHANNEL_FIELD,
    DEFAULT_COOLDOWN_PLAYBOOK_FIELD,
};
