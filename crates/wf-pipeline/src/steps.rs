//! Step interfaces the orchestrator drives

use async_trait::async_trait;

use crate::dataset::DatasetHandle;
use crate::error::PipelineResult;
use crate::loader::LoadSummary;
use crate::transform::TransformSummary;

/// First step: produce a validated dataset handle
#[async_trait]
pub trait ExtractStep: Send + Sync {
    async fn extract(&self) -> PipelineResult<DatasetHandle>;
}

/// Second step: load the dataset into the raw table
#[async_trait]
pub trait LoadStep: Send + Sync {
    async fn load(&self, dataset: &DatasetHandle) -> PipelineResult<LoadSummary>;
}

/// Third step: build the derived tables from the raw table
#[async_trait]
pub trait TransformStep: Send + Sync {
    async fn transform(&self) -> PipelineResult<TransformSummary>;
}
