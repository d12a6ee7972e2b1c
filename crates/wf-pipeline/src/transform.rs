//! Transform step: run the SQL script that builds the derived tables

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wf_core::{compute_checksum, Config, TableName};
use wf_db::{Database, DbError};

use crate::error::{PipelineError, PipelineResult};
use crate::steps::TransformStep;

/// A declared output table after the script ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTable {
    pub name: TableName,
    pub rows: usize,
}

/// Result of a successful transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSummary {
    pub script: PathBuf,
    /// SHA-256 of the script text that was executed
    pub checksum: String,
    pub tables: Vec<DerivedTable>,
}

/// Executes the transform script as one transaction.
///
/// The script is treated as opaque. Its only contract is that it leaves every
/// declared derived table behind. The file is read again on every attempt so
/// an edit between retries takes effect.
pub struct TransformRunner {
    db: Arc<dyn Database>,
    script_path: PathBuf,
    derived_tables: Vec<TableName>,
}

impl TransformRunner {
    pub fn new(
        db: Arc<dyn Database>,
        script_path: impl Into<PathBuf>,
        derived_tables: Vec<TableName>,
    ) -> Self {
        Self {
            db,
            script_path: script_path.into(),
            derived_tables,
        }
    }

    /// Runner for the script and tables named in `config`, relative to `root`
    pub fn from_config(db: Arc<dyn Database>, config: &Config, root: &Path) -> Self {
        Self::new(
            db,
            config.transform_sql_absolute(root),
            config.transform.derived_tables.clone(),
        )
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    fn failure(&self, message: impl Into<String>) -> PipelineError {
        PipelineError::TransformExecution {
            script: self.script_path.display().to_string(),
            message: message.into(),
        }
    }

    fn store_failure(&self, err: DbError) -> PipelineError {
        if err.is_connectivity() {
            PipelineError::StoreConnectivity(err)
        } else {
            self.failure(err.to_string())
        }
    }

    pub async fn run(&self) -> PipelineResult<TransformSummary> {
        let sql = fs::read_to_string(&self.script_path)
            .map_err(|e| self.failure(format!("cannot read script: {}", e)))?;
        let checksum = compute_checksum(&sql);
        log::info!(
            "Executing transform {} (checksum {})",
            self.script_path.display(),
            &checksum[..12]
        );

        self.db
            .execute_in_transaction(&sql)
            .await
            .map_err(|e| self.store_failure(e))?;

        let mut tables = Vec::with_capacity(self.derived_tables.len());
        for table in &self.derived_tables {
            let exists = self
                .db
                .relation_exists(table.as_str())
                .await
                .map_err(|e| self.store_failure(e))?;
            if !exists {
                return Err(self.failure(format!(
                    "declared output table '{}' was not created",
                    table
                )));
            }
            let rows = self
                .db
                .query_count(&format!("SELECT * FROM {}", table.quoted()))
                .await
                .map_err(|e| self.store_failure(e))?;
            tables.push(DerivedTable {
                name: table.clone(),
                rows,
            });
        }
        log::info!("Derived tables ready: {}", describe(&tables));

        Ok(TransformSummary {
            script: self.script_path.clone(),
            checksum,
            tables,
        })
    }
}

fn describe(tables: &[DerivedTable]) -> String {
    tables
        .iter()
        .map(|t| format!("{} ({} rows)", t.name, t.rows))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl TransformStep for TransformRunner {
    async fn transform(&self) -> PipelineResult<TransformSummary> {
        self.run().await
    }
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
