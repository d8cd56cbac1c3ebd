pub mod engine;
pub mod matching;
pub mod metrics;

pub use engine::ReconciliationEngine;
pub use matching::{classify, classify_all, MatchOutcome};
