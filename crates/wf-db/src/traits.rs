//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use wf_core::{CellValue, RawFrame, TableName};

/// Column names plus materialized rows of a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Database abstraction trait for wardflow
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute multiple SQL statements as one transaction.
    ///
    /// Either every statement takes effect or none does.
    async fn execute_in_transaction(&self, sql: &str) -> DbResult<()>;

    /// Replace `table` with the contents of `frame`.
    ///
    /// Drop, create and insert run in a single transaction, so the previous
    /// contents survive a failed load.
    async fn replace_table(&self, table: &TableName, frame: &RawFrame) -> DbResult<usize>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Execute a query and materialize every row
    async fn query_rows(&self, sql: &str) -> DbResult<QueryResult>;
}
