//! engine-core: Shared infrastructure for the approval and reconciliation engines.
pub mod audit;
pub mod config;
pub mod error;
pub mod ledger;
pub mod observability;
pub mod retry;

pub use async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
