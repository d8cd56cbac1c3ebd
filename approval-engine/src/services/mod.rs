pub mod engine;
pub mod metrics;

pub use engine::{ApprovalEngine, DecisionOutcome};
