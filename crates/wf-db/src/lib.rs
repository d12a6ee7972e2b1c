//! wf-db - Database abstraction layer for wardflow
//!
//! This crate provides the `Database` trait and its DuckDB implementation.
//! One backend instance owns one connection and is shared by the loader,
//! the transform runner and the dashboard reader.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, QueryResult};
