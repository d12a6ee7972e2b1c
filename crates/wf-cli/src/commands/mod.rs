//! Command implementations

pub(crate) mod common;
pub mod dashboard;
pub mod run;
pub mod schedule;
pub mod status;
