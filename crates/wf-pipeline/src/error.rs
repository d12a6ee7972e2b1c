//! Error types for wf-pipeline

use thiserror::Error;
use wf_core::CoreError;
use wf_db::DbError;

/// Step and orchestration errors.
///
/// Every variant is retried the same way by the orchestrator; the variant
/// only tells the operator what went wrong.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// P001: The dataset path is absent or not a regular file
    #[error("[P001] Dataset not found at {path}")]
    MissingDataset { path: String },

    /// P002: The CSV could not be parsed
    #[error("[P002] Failed to parse dataset {path}: {message}")]
    Parse { path: String, message: String },

    /// P003: The CSV has a header but no records and empty loads are disabled
    #[error("[P003] Dataset {path} contains no records")]
    EmptyDataset { path: String },

    /// P004: The store refused or could not serve an operation
    #[error("[P004] Store operation failed: {0}")]
    StoreConnectivity(#[source] DbError),

    /// P005: The transform script failed or did not produce its tables
    #[error("[P005] Transform {script} failed: {message}")]
    TransformExecution { script: String, message: String },

    /// P006: Run bookkeeping failed
    #[error("[P006] {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
