//! Error types for the ef-app service layer.

use crate::pipeline::Stage;
use std::path::PathBuf;

/// Application error that wraps errors from the backend crates and adds the
/// pipeline-boundary kinds frontends dispatch on.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Project(#[from] ef_project::ProjectError),

    #[error("Validation error: {0}")]
    Validation(#[from] ef_project::ValidationError),

    #[error("Engine error: {0}")]
    Engine(#[from] ef_engine::EngineError),

    #[error("Sensitivity error: {0}")]
    Sensitivity(#[from] ef_sensitivity::SensitivityError),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Run {run_id} expired and was reset")]
    RunExpired { run_id: String },

    #[error("Prerequisite not met: stage {stage} of run {run_id} called out of order")]
    PrerequisiteNotMet { run_id: String, stage: Stage },

    #[error("Lock timeout on {resource} after {waited_ms} ms")]
    LockTimeout { resource: String, waited_ms: u64 },

    #[error("Configuration missing: {path}")]
    ConfigMissing { path: PathBuf },

    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ef-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ef_store::StoreError> for AppError {
    fn from(err: ef_store::StoreError) -> Self {
        match err {
            ef_store::StoreError::LockTimeout {
                resource,
                waited_ms,
            } => AppError::LockTimeout {
                resource,
                waited_ms,
            },
            ef_store::StoreError::ConfigMissing { path } => AppError::ConfigMissing { path },
            other => AppError::Store(other.to_string()),
        }
    }
}

impl AppError {
    /// Whether a client may retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::LockTimeout { .. } | AppError::Engine(ef_engine::EngineError::Convergence { .. })
        )
    }
}
