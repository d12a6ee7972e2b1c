//! wf-core - Core library for wardflow
//!
//! This crate provides the shared types used across the pipeline: project
//! configuration, the per-run state machine and its on-disk store, schedule
//! arithmetic, and the in-memory frame a CSV is parsed into before it is
//! written to the store.

pub mod checksum;
pub mod config;
pub mod error;
pub mod frame;
pub mod run_state;
pub mod schedule;
pub(crate) mod serde_helpers;
pub mod sql_utils;
pub mod step;
pub mod table_name;

pub use checksum::{compute_checksum, config_fingerprint};
pub use config::{Config, DatabaseConfig, DatasetConfig, RetryPolicy, ScheduleConfig, TransformConfig};
pub use error::{CoreError, CoreResult};
pub use frame::{CellValue, Column, ColumnType, RawFrame};
pub use run_state::{
    Run, RunPhase, RunStatus, RunStore, RunSummary, RunTrigger, StepRecord, StepStatus,
};
pub use schedule::Schedule;
pub use step::StepId;
pub use table_name::TableName;
