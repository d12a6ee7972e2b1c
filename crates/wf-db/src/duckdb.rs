//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, QueryResult};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{appender_params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use wf_core::sql_utils::{escape_sql_string, quote_ident, split_qualified_name};
use wf_core::{CellValue, RawFrame, TableName};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_in_transaction_sync(&self, sql: &str) -> DbResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        // Dropping `tx` on error rolls the whole batch back
        tx.execute_batch(sql)?;
        tx.commit()
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    fn replace_table_sync(&self, table: &TableName, frame: &RawFrame) -> DbResult<usize> {
        if frame.columns.is_empty() {
            return Err(DbError::LoadError {
                table: table.to_string(),
                message: "frame has no columns".to_string(),
            });
        }
        let load_error = |e: duckdb::Error| DbError::LoadError {
            table: table.to_string(),
            message: e.to_string(),
        };

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if table.schema() != "main" {
            tx.execute_batch(&format!(
                "CREATE SCHEMA IF NOT EXISTS {}",
                quote_ident(table.schema())
            ))?;
        }
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", table.quoted()))?;
        tx.execute_batch(&create_table_sql(table, frame))?;

        {
            let mut appender = tx
                .appender_to_db(table.table(), table.schema())
                .map_err(load_error)?;
            for row in &frame.rows {
                appender
                    .append_row(appender_params_from_iter(row.iter().map(to_duckdb_value)))
                    .map_err(load_error)?;
            }
            appender.flush().map_err(load_error)?;
        }

        tx.commit()
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(frame.row_count())
    }

    /// Query count synchronously
    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    fn query_rows_sync(&self, sql: &str) -> DbResult<QueryResult> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let columns = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut result = QueryResult {
            columns,
            rows: Vec::new(),
        };
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(result.columns.len());
            for idx in 0..result.columns.len() {
                let value: Value = row.get(idx)?;
                cells.push(from_duckdb_value(value));
            }
            result.rows.push(cells);
        }
        Ok(result)
    }

    /// Tables and views both count
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let (schema, table) = split_qualified_name(name);
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
            escape_sql_string(schema),
            escape_sql_string(table)
        );
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute_in_transaction(&self, sql: &str) -> DbResult<()> {
        self.execute_in_transaction_sync(sql)
    }

    async fn replace_table(&self, table: &TableName, frame: &RawFrame) -> DbResult<usize> {
        let rows = self.replace_table_sync(table, frame)?;
        log::debug!(
            "Replaced {} with {} rows x {} columns",
            table,
            rows,
            frame.column_count()
        );
        Ok(rows)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<QueryResult> {
        self.query_rows_sync(sql)
    }
}

/// CREATE TABLE statement for a frame; column names are kept verbatim
fn create_table_sql(table: &TableName, frame: &RawFrame) -> String {
    let columns: Vec<String> = frame
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql_type()))
        .collect();
    format!("CREATE TABLE {} ({})", table.quoted(), columns.join(", "))
}

fn to_duckdb_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Boolean(b) => Value::Boolean(*b),
        CellValue::BigInt(v) => Value::BigInt(*v),
        CellValue::Double(v) => Value::Double(*v),
        CellValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_duckdb_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Boolean(b) => CellValue::Boolean(b),
        Value::TinyInt(v) => CellValue::BigInt(i64::from(v)),
        Value::SmallInt(v) => CellValue::BigInt(i64::from(v)),
        Value::Int(v) => CellValue::BigInt(i64::from(v)),
        Value::BigInt(v) => CellValue::BigInt(v),
        Value::UTinyInt(v) => CellValue::BigInt(i64::from(v)),
        Value::USmallInt(v) => CellValue::BigInt(i64::from(v)),
        Value::UInt(v) => CellValue::BigInt(i64::from(v)),
        Value::UBigInt(v) => match i64::try_from(v) {
            Ok(v) => CellValue::BigInt(v),
            Err(_) => CellValue::Text(v.to_string()),
        },
        Value::HugeInt(v) => match i64::try_from(v) {
            Ok(v) => CellValue::BigInt(v),
            Err(_) => CellValue::Text(v.to_string()),
        },
        Value::Float(v) => CellValue::Double(f64::from(v)),
        Value::Double(v) => CellValue::Double(v),
        Value::Text(s) => CellValue::Text(s),
        // Dates, decimals, nested types: callers CAST to scalar types they need
        other => CellValue::Text(format!("{:?}", other)),
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
