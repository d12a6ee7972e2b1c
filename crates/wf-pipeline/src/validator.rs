//! Extract step: confirm the dataset is present

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::DatasetHandle;
use crate::error::{PipelineError, PipelineResult};
use crate::steps::ExtractStep;

/// Checks that the configured dataset path points at a regular file
#[derive(Debug, Clone)]
pub struct PathValidator {
    path: PathBuf,
}

impl PathValidator {
    /// The path is fixed at construction; every attempt re-checks it
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn validate(&self) -> PipelineResult<DatasetHandle> {
        let missing = || PipelineError::MissingDataset {
            path: self.path.display().to_string(),
        };

        let metadata = fs::metadata(&self.path).map_err(|_| missing())?;
        if !metadata.is_file() {
            return Err(missing());
        }

        log::info!("Dataset found at {}", self.path.display());
        Ok(DatasetHandle::new(self.path.clone(), metadata.len()))
    }
}

#[async_trait]
impl ExtractStep for PathValidator {
    async fn extract(&self) -> PipelineResult<DatasetHandle> {
        self.validate()
    }
}
