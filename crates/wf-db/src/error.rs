//! Error types for wf-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Bulk load error (D004)
    #[error("[D004] Bulk load into {table} failed: {message}")]
    LoadError { table: String, message: String },

    /// Transaction could not be committed (D005)
    #[error("[D005] Transaction rolled back: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

impl DbError {
    /// Whether the error means the store itself is unusable, as opposed to
    /// a statement being rejected
    pub fn is_connectivity(&self) -> bool {
        matches!(self, DbError::ConnectionError(_) | DbError::MutexPoisoned(_))
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error has no structured catalog variants, so classify by message
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("View with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else if msg.contains("Connection Error") || msg.contains("IO Error") {
            DbError::ConnectionError(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
