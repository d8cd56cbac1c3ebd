//! Approval Engine - Multi-level maintenance cost approval workflow.
pub mod models;
pub mod services;
