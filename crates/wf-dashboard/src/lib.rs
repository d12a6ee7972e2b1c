//! wf-dashboard - Read-only views over the derived HDHI tables
//!
//! [`DashboardReader`] runs the dashboard queries against the store and
//! returns typed rows; [`render`] turns them into plain-text tables.

pub mod error;
pub mod reader;
pub mod render;

pub use error::{DashboardError, DashboardResult};
pub use reader::{
    DashboardReader, DashboardSnapshot, DiagnosisCount, MonthlyAggregate, RiskBucket,
    DIAGNOSIS_COLUMNS, MAX_RISK_SCORE,
};
