//! wf-pipeline - The HDHI extract, load and transform chain
//!
//! Three steps run strictly in order for every run:
//!
//! 1. [`PathValidator`] confirms the dataset exists and yields a
//!    [`DatasetHandle`].
//! 2. [`RawLoader`] parses the CSV behind that handle and replaces the raw
//!    table with it.
//! 3. [`TransformRunner`] executes the SQL script that builds the derived
//!    tables.
//!
//! [`Pipeline`] drives one run through the `wf_core::Run` state machine with
//! bounded retries, and [`Scheduler`] fires runs on a fixed interval.

pub mod csv_reader;
pub mod dataset;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod orchestrator;
pub mod scheduler;
pub mod steps;
pub mod transform;
pub mod validator;

pub use dataset::DatasetHandle;
pub use error::{PipelineError, PipelineResult};
pub use hooks::{LogObserver, RunObserver, RunStoreObserver};
pub use loader::{LoadSummary, RawLoader};
pub use orchestrator::{Pipeline, RunOutcome, StepFailure};
pub use scheduler::{Scheduler, TickOutcome};
pub use steps::{ExtractStep, LoadStep, TransformStep};
pub use transform::{DerivedTable, TransformRunner, TransformSummary};
pub use validator::PathValidator;
