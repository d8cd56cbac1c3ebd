//! Reconciliation Engine - Heuristic matching of bank transactions against
//! receivable and payable records.
pub mod models;
pub mod services;
