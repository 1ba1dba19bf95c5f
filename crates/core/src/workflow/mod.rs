//! Workflow engine.
//!
//! Loads the per-type state graphs and authorizes transitions by signatory
//! role. Failures are always `WorkflowViolation`.

mod registry;
mod service;
mod types;

#[cfg(test)]
mod service_props;

pub use registry::WorkflowRegistry;
pub use types::{
    Creation, Direction, Parties, STATE_COMPLETED, STATE_INITIATED, STATE_PENDING,
    STATE_VALIDATED, Signatory, Transition, Workflow,
};
