//! Error types for fcw-client
//!
//! Local no-ops and partial acceptance are not errors; they are reported
//! through outcome enums. Every variant here leaves the workbench in a
//! retryable state.

use crate::gateway::ApiError;
use thiserror::Error;

/// Workflow error type
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Blank required field or malformed parameter, rejected before any
    /// network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure or non-success status from the service
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Preference store could not be read or written
    #[error("Preference store error: {0}")]
    Preferences(String),

    /// Export document could not be written
    #[error("Export error: {0}")]
    Export(String),

    /// fcw-common error
    #[error("Common error: {0}")]
    Common(#[from] fcw_common::Error),
}

impl WorkflowError {
    /// True for errors raised locally before reaching the service
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
