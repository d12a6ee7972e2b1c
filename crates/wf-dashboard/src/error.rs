//! Error types for wf-dashboard

use thiserror::Error;
use wf_db::DbError;

/// Dashboard query errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// V001: A derived table has not been built yet
    #[error("[V001] Table '{table}' does not exist; run the pipeline first")]
    MissingTable { table: String },

    /// V002: A query against the store failed
    #[error("[V002] Dashboard query failed: {0}")]
    Query(#[from] DbError),

    /// V003: A column held a value of the wrong shape
    #[error("[V003] Unexpected value in column '{column}': {value}")]
    UnexpectedValue { column: String, value: String },
}

/// Result type alias for DashboardError
pub type DashboardResult<T> = Result<T, DashboardError>;
