//! End-to-end runs of the HDHI chain against an in-memory store and the
//! reference transform script.

use chrono::{TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use wf_core::{Config, RunStatus, RunTrigger, StepId, StepStatus};
use wf_db::{Database, DuckDbBackend};
use wf_pipeline::{Pipeline, PipelineError};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn reference_project() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../pipelines/hdhi")
}

/// A project dir with the reference config and script, `dataset` copied in
/// as the configured CSV, and retries disabled
fn project(dataset: Option<&Path>) -> (TempDir, Config) {
    let root = TempDir::new().unwrap();
    let reference = reference_project();

    fs::create_dir_all(root.path().join("sql")).unwrap();
    fs::copy(
        reference.join("sql/transform_hdhi.sql"),
        root.path().join("sql/transform_hdhi.sql"),
    )
    .unwrap();

    let mut config = Config::load_from_dir(&reference).unwrap();
    config.retry.max_retries = 0;
    config.retry.delay_secs = 0;

    if let Some(src) = dataset {
        let dest = root.path().join(&config.dataset.path);
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::copy(src, dest).unwrap();
    }
    (root, config)
}

fn memory_db() -> Arc<dyn Database> {
    Arc::new(DuckDbBackend::in_memory().unwrap())
}

fn logical() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

async fn dashboard_rows(db: &Arc<dyn Database>) -> Vec<Vec<String>> {
    db.query_rows(
        "SELECT month, total_admissions, emergency_cases, opd_cases, count_long_icu, \
         count_cardiac_distress, count_metabolic_risk \
         FROM analytics_hdhi_dashboard ORDER BY month",
    )
    .await
    .unwrap()
    .rows
    .into_iter()
    .map(|row| row.iter().map(|c| c.to_string()).collect())
    .collect()
}

#[tokio::test]
async fn test_full_run_builds_derived_tables() {
    let (root, config) = project(Some(&fixture("hdhi_sample.csv")));
    let db = memory_db();
    let pipeline = Pipeline::from_config(&config, root.path(), None, db.clone());

    let outcome = pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();

    assert!(outcome.succeeded(), "run failed: {:?}", outcome.failure);
    assert_eq!(outcome.run.status, RunStatus::Succeeded);
    for step in StepId::ALL {
        assert_eq!(outcome.run.step(step).status, StepStatus::Succeeded);
        assert_eq!(outcome.run.step(step).attempts, 1);
    }

    assert_eq!(db.query_count("SELECT * FROM hdhi_raw").await.unwrap(), 8);
    assert_eq!(
        db.query_count("SELECT * FROM analytics_hdhi_clean").await.unwrap(),
        8
    );
    assert_eq!(
        dashboard_rows(&db).await,
        vec![
            vec!["2017-04", "4", "3", "1", "2", "2", "2"],
            vec!["2017-05", "3", "2", "1", "1", "1", "1"],
            vec!["2017-06", "1", "0", "1", "0", "0", "0"],
        ]
    );
}

#[tokio::test]
async fn test_raw_table_keeps_verbatim_headers() {
    let (root, config) = project(Some(&fixture("hdhi_sample.csv")));
    let db = memory_db();
    let pipeline = Pipeline::from_config(&config, root.path(), None, db.clone());
    pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();

    let result = db
        .query_rows(r#"SELECT "SMOKING ", "TYPE OF ADMISSION-EMERGENCY/OPD" FROM hdhi_raw LIMIT 1"#)
        .await
        .unwrap();
    assert_eq!(
        result.columns,
        vec!["SMOKING ", "TYPE OF ADMISSION-EMERGENCY/OPD"]
    );
}

#[tokio::test]
async fn test_repeated_runs_produce_identical_tables() {
    let (root, config) = project(Some(&fixture("hdhi_sample.csv")));
    let db = memory_db();
    let pipeline = Pipeline::from_config(&config, root.path(), None, db.clone());

    pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();
    let first_dashboard = dashboard_rows(&db).await;
    let first_clean = db
        .query_rows("SELECT * FROM analytics_hdhi_clean ORDER BY sno")
        .await
        .unwrap();

    let outcome = pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();
    assert!(outcome.succeeded());

    assert_eq!(dashboard_rows(&db).await, first_dashboard);
    assert_eq!(
        db.query_rows("SELECT * FROM analytics_hdhi_clean ORDER BY sno")
            .await
            .unwrap(),
        first_clean
    );
    assert_eq!(db.query_count("SELECT * FROM hdhi_raw").await.unwrap(), 8);
}

#[tokio::test]
async fn test_header_only_dataset_gives_empty_tables() {
    let (root, config) = project(Some(&fixture("hdhi_header_only.csv")));
    let db = memory_db();
    let pipeline = Pipeline::from_config(&config, root.path(), None, db.clone());

    let outcome = pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();

    assert!(outcome.succeeded(), "run failed: {:?}", outcome.failure);
    assert_eq!(db.query_count("SELECT * FROM hdhi_raw").await.unwrap(), 0);
    assert!(dashboard_rows(&db).await.is_empty());
}

#[tokio::test]
async fn test_header_only_dataset_rejected_when_disallowed() {
    let (root, mut config) = project(Some(&fixture("hdhi_header_only.csv")));
    config.dataset.allow_empty = false;
    let db = memory_db();
    let pipeline = Pipeline::from_config(&config, root.path(), None, db.clone());

    let outcome = pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();

    let failure = outcome.failure.unwrap();
    assert_eq!(failure.step, StepId::Load);
    assert!(matches!(failure.error, PipelineError::EmptyDataset { .. }));
    assert_eq!(outcome.run.step(StepId::Transform).status, StepStatus::Skipped);
}

#[tokio::test]
async fn test_missing_dataset_never_loads() {
    let (root, mut config) = project(None);
    config.retry.max_retries = 2;
    let db = memory_db();
    let pipeline = Pipeline::from_config(&config, root.path(), None, db.clone());

    let outcome = pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();

    let failure = outcome.failure.unwrap();
    assert_eq!(failure.step, StepId::Extract);
    assert_eq!(failure.attempts, 3);
    assert!(matches!(failure.error, PipelineError::MissingDataset { .. }));
    assert_eq!(outcome.run.step(StepId::Load).attempts, 0);
    assert!(!db.relation_exists("hdhi_raw").await.unwrap());
}

#[tokio::test]
async fn test_dataset_override_path() {
    let (root, config) = project(None);
    let db = memory_db();
    let override_path = fixture("hdhi_sample.csv");
    let pipeline = Pipeline::from_config(
        &config,
        root.path(),
        Some(override_path.to_str().unwrap()),
        db.clone(),
    );

    let outcome = pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();
    assert!(outcome.succeeded(), "run failed: {:?}", outcome.failure);
}

#[tokio::test]
async fn test_broken_transform_keeps_previous_outputs() {
    let (root, config) = project(Some(&fixture("hdhi_sample.csv")));
    let db = memory_db();
    let pipeline = Pipeline::from_config(&config, root.path(), None, db.clone());
    pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();
    let before = dashboard_rows(&db).await;

    let script = root.path().join(&config.transform.sql_path);
    fs::write(
        &script,
        "DROP TABLE analytics_hdhi_dashboard; SELECT * FROM not_a_table;",
    )
    .unwrap();

    let outcome = pipeline.trigger(logical(), RunTrigger::Manual).await.unwrap();
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.step, StepId::Transform);
    assert!(matches!(
        failure.error,
        PipelineError::TransformExecution { .. }
    ));
    assert_eq!(dashboard_rows(&db).await, before);
}
