//! Load step: replace the raw table with the dataset contents

use async_trait::async_trait;
use std::sync::Arc;

use wf_core::{Config, TableName};
use wf_db::Database;

use crate::csv_reader::read_frame;
use crate::dataset::DatasetHandle;
use crate::error::{PipelineError, PipelineResult};
use crate::steps::LoadStep;

/// Result of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: TableName,
    pub rows: usize,
    pub columns: usize,
}

/// Parses the dataset CSV and fully replaces the raw table with it.
///
/// Never appends or merges: after a successful load the table holds exactly
/// the rows of the file that was just read.
pub struct RawLoader {
    db: Arc<dyn Database>,
    table: TableName,
    delimiter: char,
    allow_empty: bool,
}

impl RawLoader {
    pub fn new(db: Arc<dyn Database>, table: TableName) -> Self {
        Self {
            db,
            table,
            delimiter: ',',
            allow_empty: true,
        }
    }

    /// Loader configured from the `dataset` and `database` sections
    pub fn from_config(db: Arc<dyn Database>, config: &Config) -> Self {
        Self::new(db, config.database.raw_table.clone())
            .with_delimiter(config.dataset.delimiter)
            .with_allow_empty(config.dataset.allow_empty)
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// When false, a header-only file fails with `EmptyDataset`
    pub fn with_allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub async fn load_dataset(&self, dataset: &DatasetHandle) -> PipelineResult<LoadSummary> {
        let frame = read_frame(dataset.path(), self.delimiter)?;
        if frame.is_empty() && !self.allow_empty {
            return Err(PipelineError::EmptyDataset {
                path: dataset.path().display().to_string(),
            });
        }

        log::info!("Loading raw dataset ({} rows)", frame.row_count());
        let rows = self
            .db
            .replace_table(&self.table, &frame)
            .await
            .map_err(PipelineError::StoreConnectivity)?;
        log::info!("Raw data loaded into table '{}'", self.table);

        Ok(LoadSummary {
            table: self.table.clone(),
            rows,
            columns: frame.column_count(),
        })
    }
}

#[async_trait]
impl LoadStep for RawLoader {
    async fn load(&self, dataset: &DatasetHandle) -> PipelineResult<LoadSummary> {
        self.load_dataset(dataset).await
    }
}
