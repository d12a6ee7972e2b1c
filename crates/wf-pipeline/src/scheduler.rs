//! Interval scheduler
//!
//! Fires one run per closed interval. Only the most recent closed interval is
//! ever eligible: intervals missed while the scheduler was down are logged
//! and skipped, never backfilled.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use wf_core::{RunStore, RunTrigger, Schedule};

use crate::error::PipelineResult;
use crate::orchestrator::{Pipeline, RunOutcome};

/// What a single scheduler tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// No interval has closed since the schedule start
    NotDue,
    /// The latest closed interval already has a scheduled run
    AlreadyRan(DateTime<Utc>),
    Ran(RunOutcome),
}

pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    schedule: Schedule,
    store: RunStore,
}

impl Scheduler {
    /// `store` is the run history consulted before each run and written
    /// after it
    pub fn new(pipeline: Arc<Pipeline>, schedule: Schedule, store: RunStore) -> Self {
        Self {
            pipeline,
            schedule,
            store,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Run the latest closed interval at `now` unless it already ran
    pub async fn tick(&self, now: DateTime<Utc>) -> PipelineResult<TickOutcome> {
        let Some(logical_date) = self.schedule.latest_due(now) else {
            return Ok(TickOutcome::NotDue);
        };

        if self.store.has_scheduled_run_for(logical_date)? {
            return Ok(TickOutcome::AlreadyRan(logical_date));
        }

        if let Some(last) = self.store.latest_scheduled()? {
            let missed = self.schedule.missed_between(last.logical_date, now);
            if missed > 0 {
                log::warn!(
                    "Skipping {} missed interval(s) between {} and {}",
                    missed,
                    last.logical_date.format("%Y-%m-%d %H:%M"),
                    logical_date.format("%Y-%m-%d %H:%M")
                );
            }
        }

        let outcome = self
            .pipeline
            .trigger(logical_date, RunTrigger::Scheduled)
            .await?;
        self.store.save(&outcome.run)?;
        Ok(TickOutcome::Ran(outcome))
    }

    /// Tick, then sleep until the next interval closes, until `shutdown`
    /// resolves. A run in progress is always allowed to finish.
    pub async fn run_forever<F>(&self, shutdown: F) -> PipelineResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            match self.tick(Utc::now()).await? {
                TickOutcome::NotDue => log::info!("No interval has closed yet"),
                TickOutcome::AlreadyRan(logical_date) => log::debug!(
                    "Interval {} already ran",
                    logical_date.format("%Y-%m-%d %H:%M")
                ),
                TickOutcome::Ran(outcome) => {
                    if let Some(failure) = &outcome.failure {
                        log::error!(
                            "Scheduled run {} failed at {}: {}",
                            outcome.run.run_id,
                            failure.step,
                            failure.error
                        );
                    }
                }
            }

            let now = Utc::now();
            let Some(next) = self.schedule.next_fire_after(now) else {
                log::warn!("Schedule {} has no further fire times", self.schedule);
                return Ok(());
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            log::info!("Next run at {}", next.format("%Y-%m-%d %H:%M:%S UTC"));

            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Scheduler stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
