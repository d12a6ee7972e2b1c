//! Cron-driven interval schedules
//!
//! Consecutive cron fire times bound the intervals. A run covers one interval
//! `[logical_date, next fire)` and becomes due once that interval has closed.
//! Missed intervals are never backfilled: only the most recent closed
//! interval is ever eligible.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Interval used when the config names none
pub const DEFAULT_INTERVAL: &str = "@daily";

/// Preset names and their cron equivalents (seconds field first)
const PRESETS: [(&str, &str); 5] = [
    ("@hourly", "0 0 * * * *"),
    ("@daily", "0 0 0 * * *"),
    ("@weekly", "0 0 0 * * SUN"),
    ("@monthly", "0 0 0 1 * *"),
    ("@yearly", "0 0 0 1 1 *"),
];

/// Cron expression for a preset, a classic five-field spec or a
/// seconds-first spec
fn cron_expression(interval: &str) -> String {
    let interval = interval.trim();
    if let Some((_, expr)) = PRESETS.iter().find(|(name, _)| *name == interval) {
        return expr.to_string();
    }
    if interval.split_whitespace().count() == 5 {
        format!("0 {}", interval)
    } else {
        interval.to_string()
    }
}

/// A cron schedule anchored at a start instant
#[derive(Debug, Clone)]
pub struct Schedule {
    interval: String,
    cron: cron::Schedule,
    start: DateTime<Utc>,
}

impl Schedule {
    /// Parse `interval` (a preset such as `@daily`, or a cron expression)
    pub fn parse(interval: &str, start: DateTime<Utc>) -> CoreResult<Self> {
        let cron = cron::Schedule::from_str(&cron_expression(interval)).map_err(|e| {
            CoreError::InvalidSchedule {
                value: interval.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            interval: interval.trim().to_string(),
            cron,
            start,
        })
    }

    /// Anchor the schedule at midnight UTC of `start_date`
    pub fn from_start_date(interval: &str, start_date: NaiveDate) -> CoreResult<Self> {
        Self::parse(interval, start_date.and_time(NaiveTime::MIN).and_utc())
    }

    /// The interval as configured
    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Fire times are strictly after the anchor; step back so `start`
    /// itself counts when it matches
    fn floor(&self) -> DateTime<Utc> {
        self.start - TimeDelta::seconds(1)
    }

    /// The last two fire times at or before `now`, not earlier than `start`
    fn last_closed(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let floor = self.floor();
        let mut lookback = TimeDelta::days(1);
        loop {
            let anchor = (now - lookback).max(floor);
            let mut previous = None;
            let mut last = None;
            for fire in self.cron.after(&anchor).take_while(|t| *t <= now) {
                previous = last;
                last = Some(fire);
            }
            if let (Some(previous), Some(last)) = (previous, last) {
                return Some((previous, last));
            }
            if anchor == floor {
                return None;
            }
            lookback = lookback * 2;
        }
    }

    /// Logical date of the most recent interval that has closed by `now`.
    ///
    /// `None` until the first interval after `start` has elapsed.
    pub fn latest_due(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.last_closed(now).map(|(logical_date, _)| logical_date)
    }

    /// The next instant strictly after `now` at which an interval closes.
    ///
    /// `None` when the expression has no further fire times.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let first = self.cron.after(&self.floor()).next()?;
        if now < first {
            return self.cron.after(&first).next();
        }
        self.cron.after(&now).next()
    }

    /// Closed intervals that fall strictly between `last_logical` and the
    /// latest due interval at `now`. These are skipped, never backfilled.
    pub fn missed_between(&self, last_logical: DateTime<Utc>, now: DateTime<Utc>) -> usize {
        match self.latest_due(now) {
            Some(latest) if latest > last_logical => self
                .cron
                .after(&last_logical)
                .take_while(|t| *t < latest)
                .count(),
            _ => 0,
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.interval)
    }
}

#[cfg(test)]
#[path = "schedule_test.rs"]
mod tests;
