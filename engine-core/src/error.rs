use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("storage error: {0}")]
    StorageError(anyhow::Error),
}

impl AppError {
    /// Only write contention can succeed on retry; every other variant needs
    /// an external state change first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }

    /// Stable label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::InvalidState(_) => "invalid_state",
            AppError::Conflict(_) => "conflict",
            AppError::ValidationError(_) => "validation",
            AppError::ConfigError(_) => "config",
            AppError::StorageError(_) => "storage",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::StorageError(anyhow::Error::new(err))
    }
}
