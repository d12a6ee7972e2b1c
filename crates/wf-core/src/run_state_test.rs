use super::*;
use chrono::TimeZone;
use tempfile::tempdir;

fn logical(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
}

fn new_run() -> Run {
    Run::new("hdhi_elt_pipeline", logical(1), RunTrigger::Manual, "abc123")
}

fn run_step(run: &mut Run, step: StepId) {
    run.start_step(step).unwrap();
    run.begin_attempt(step).unwrap();
    run.complete_step(step).unwrap();
}

#[test]
fn test_run_new() {
    let run = new_run();
    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.phase, RunPhase::Pending);
    assert_eq!(run.steps.len(), 3);
    assert_eq!(run.run_id.len(), 8);
    assert!(run.steps.iter().all(|s| s.status == StepStatus::Pending));
    assert_eq!(run.step(StepId::Transform).step, StepId::Transform);
}

#[test]
fn test_happy_path_walks_every_phase() {
    let mut run = new_run();

    run.start_step(StepId::Extract).unwrap();
    assert_eq!(run.phase.to_string(), "extract_running");
    assert_eq!(run.status, RunStatus::Running);
    run.begin_attempt(StepId::Extract).unwrap();
    run.complete_step(StepId::Extract).unwrap();
    assert_eq!(run.phase.to_string(), "extract_done");
    assert!(!run.phase.is_terminal());

    run_step(&mut run, StepId::Load);
    assert_eq!(run.phase, RunPhase::Done(StepId::Load));

    run_step(&mut run, StepId::Transform);
    assert_eq!(run.phase.to_string(), "transform_done");
    assert!(run.phase.is_terminal());
    assert!(run.succeeded());
    assert!(run.finished_at.is_some());
    assert!(run.steps.iter().all(|s| s.error.is_none()));
}

#[test]
fn test_step_cannot_start_before_predecessor_done() {
    let mut run = new_run();
    let err = run.start_step(StepId::Load).unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    let err = run.start_step(StepId::Transform).unwrap_err();
    assert!(err.to_string().contains("pending"));
    assert!(err.to_string().contains("transform_running"));

    run_step(&mut run, StepId::Extract);
    // Skipping load is still rejected
    assert!(run.start_step(StepId::Transform).is_err());
    assert_eq!(run.step(StepId::Transform).status, StepStatus::Pending);
}

#[test]
fn test_step_cannot_start_twice() {
    let mut run = new_run();
    run.start_step(StepId::Extract).unwrap();
    assert!(run.start_step(StepId::Extract).is_err());
}

#[test]
fn test_attempts_are_counted() {
    let mut run = new_run();
    run.start_step(StepId::Extract).unwrap();
    assert_eq!(run.begin_attempt(StepId::Extract).unwrap(), 1);
    run.schedule_retry(StepId::Extract, "missing").unwrap();
    assert_eq!(run.step(StepId::Extract).status, StepStatus::UpForRetry);
    assert_eq!(run.begin_attempt(StepId::Extract).unwrap(), 2);
    assert_eq!(run.step(StepId::Extract).status, StepStatus::Running);
    run.complete_step(StepId::Extract).unwrap();

    let record = run.step(StepId::Extract);
    assert_eq!(record.attempts, 2);
    assert_eq!(record.status, StepStatus::Succeeded);
    assert!(record.error.is_none());
}

#[test]
fn test_attempt_requires_running_step() {
    let mut run = new_run();
    assert!(run.begin_attempt(StepId::Extract).is_err());
    assert!(run.schedule_retry(StepId::Extract, "x").is_err());
    assert!(run.complete_step(StepId::Extract).is_err());
}

#[test]
fn test_failure_skips_downstream() {
    let mut run = new_run();
    run.start_step(StepId::Extract).unwrap();
    run.begin_attempt(StepId::Extract).unwrap();
    run.fail_step(StepId::Extract, "Dataset missing").unwrap();

    assert_eq!(run.phase.to_string(), "extract_failed");
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.phase.is_terminal());
    assert_eq!(run.step(StepId::Load).status, StepStatus::Skipped);
    assert_eq!(run.step(StepId::Transform).status, StepStatus::Skipped);
    assert_eq!(run.step(StepId::Load).attempts, 0);

    assert_eq!(run.phase, RunPhase::Failed(StepId::Extract));
    let failed = run.step(StepId::Extract);
    assert_eq!(failed.status, StepStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("Dataset missing"));

    // Terminal: nothing can start afterwards
    assert!(run.start_step(StepId::Load).is_err());
}

#[test]
fn test_summary() {
    let mut run = new_run();
    run_step(&mut run, StepId::Extract);
    run.start_step(StepId::Load).unwrap();
    for _ in 0..3 {
        run.begin_attempt(StepId::Load).unwrap();
    }
    run.fail_step(StepId::Load, "store down").unwrap();

    let summary = run.summary();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.total_attempts, 4);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.json");

    let mut run = new_run();
    run_step(&mut run, StepId::Extract);
    run.save(&path).unwrap();

    let loaded = Run::load(&path).unwrap().unwrap();
    assert_eq!(loaded.run_id, run.run_id);
    assert_eq!(loaded.phase, RunPhase::Done(StepId::Extract));
    assert_eq!(loaded.step(StepId::Extract).attempts, 1);
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn test_load_missing_returns_none() {
    let dir = tempdir().unwrap();
    assert!(Run::load(&dir.path().join("nope.json")).unwrap().is_none());
}

#[test]
fn test_load_corrupt_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{not json").unwrap();
    let err = Run::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::CorruptRunState { .. }));
}

#[test]
fn test_run_store_orders_by_logical_date() {
    let dir = tempdir().unwrap();
    let store = RunStore::new(dir.path());
    assert!(store.list().unwrap().is_empty());
    assert!(store.latest_scheduled().unwrap().is_none());

    for day in [3, 1, 2] {
        let run = Run::new("p", logical(day), RunTrigger::Scheduled, "h");
        store.save(&run).unwrap();
    }
    let runs_dir = dir.path().join("runs");
    std::fs::write(runs_dir.join("garbage.json"), "[]").unwrap();
    std::fs::write(runs_dir.join("notes.txt"), "ignored").unwrap();

    let runs = store.list().unwrap();
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].logical_date, logical(1));
    assert_eq!(
        store.latest_scheduled().unwrap().unwrap().logical_date,
        logical(3)
    );

    let recent = store.recent(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].logical_date, logical(3));
    assert_eq!(recent[1].logical_date, logical(2));

    assert!(store.has_scheduled_run_for(logical(2)).unwrap());
    assert!(!store.has_scheduled_run_for(logical(9)).unwrap());
}

#[test]
fn test_manual_runs_do_not_claim_scheduled_intervals() {
    let dir = tempdir().unwrap();
    let store = RunStore::new(dir.path());
    store
        .save(&Run::new("p", logical(4), RunTrigger::Scheduled, "h"))
        .unwrap();
    store
        .save(&Run::new("p", logical(5), RunTrigger::Manual, "h"))
        .unwrap();

    assert!(!store.has_scheduled_run_for(logical(5)).unwrap());
    assert!(store.has_scheduled_run_for(logical(4)).unwrap());
    // The newer manual run is ignored
    assert_eq!(
        store.latest_scheduled().unwrap().unwrap().logical_date,
        logical(4)
    );
}

#[test]
fn test_run_store_overwrites_same_run() {
    let dir = tempdir().unwrap();
    let store = RunStore::new(dir.path());
    let mut run = new_run();
    let first = store.save(&run).unwrap();
    run_step(&mut run, StepId::Extract);
    let second = store.save(&run).unwrap();

    assert_eq!(first, second);
    let runs = store.list().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].phase, RunPhase::Done(StepId::Extract));
}
