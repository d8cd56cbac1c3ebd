//! Configuration for the engine crates.
//!
//! Business tunables (escalation threshold, match tolerance, description
//! markers) are configuration, not literals, so they can be tuned per
//! deployment without touching the transition rules.

use crate::error::AppError;
use crate::retry::RetryConfig;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service_name: String,
    pub log_level: String,
    pub approval: ApprovalConfig,
    pub matching: MatchingConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct ApprovalConfig {
    /// Costs strictly above this amount escalate from Manager to Director.
    pub escalation_threshold: Decimal,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: Decimal::new(5000, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Absolute currency tolerance for amount comparison (strict `<`).
    /// Directly affects the false-positive match rate.
    pub amount_tolerance: Decimal,
    /// Generic client-identifying token searched in inflow descriptions.
    pub client_marker: String,
    /// Generic supplier marker searched in outflow descriptions.
    pub supplier_marker: String,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: Decimal::new(5, 2),
            client_marker: "cliente".to_string(),
            supplier_marker: "fornecedor".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let approval = ApprovalConfig {
            escalation_threshold: decimal_var(
                "APPROVAL_ESCALATION_THRESHOLD",
                ApprovalConfig::default().escalation_threshold,
            )?,
        };
        if approval.escalation_threshold < Decimal::ZERO {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "APPROVAL_ESCALATION_THRESHOLD must be non-negative"
            )));
        }

        let defaults = MatchingConfig::default();
        let matching = MatchingConfig {
            amount_tolerance: decimal_var("MATCH_AMOUNT_TOLERANCE", defaults.amount_tolerance)?,
            client_marker: env::var("MATCH_CLIENT_MARKER").unwrap_or(defaults.client_marker),
            supplier_marker: env::var("MATCH_SUPPLIER_MARKER").unwrap_or(defaults.supplier_marker),
        };
        if matching.amount_tolerance <= Decimal::ZERO {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MATCH_AMOUNT_TOLERANCE must be positive"
            )));
        }

        Ok(Self {
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "asset-engines".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            approval,
            matching,
            retry: RetryConfig {
                max_retries: env::var("LEDGER_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                ..RetryConfig::default()
            },
        })
    }
}

fn decimal_var(name: &str, default: Decimal) -> Result<Decimal, AppError> {
    match env::var(name) {
        Ok(raw) => Decimal::from_str(&raw).map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a decimal, got {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
