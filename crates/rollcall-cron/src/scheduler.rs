// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock trigger scheduler.
//!
//! Each trigger is a daily cron pattern (`M H * * *`) evaluated in the
//! configured timezone. Patterns are rebuilt from the effective settings on
//! every tick, so an admin change takes effect within one tick. Firings
//! missed while the process was down are not replayed.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use croner::Cron;
use rollcall_attendance::AttendanceSettings;
use rollcall_core::{Clock, RollcallError};
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on a single sleep, so settings changes are picked up.
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

/// The three daily lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    WindowStart,
    WindowEnd,
    Report,
}

/// Receives trigger firings.
#[async_trait]
pub trait TriggerHandler: Send + Sync + 'static {
    /// Handle `trigger`, scheduled for `at`. Errors are the handler's to log.
    async fn fire(&self, trigger: Trigger, at: DateTime<Utc>);
}

/// Local times of day for each trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub report: NaiveTime,
}

impl Schedule {
    fn entries(&self) -> [(Trigger, NaiveTime); 3] {
        [
            (Trigger::WindowStart, self.window_start),
            (Trigger::WindowEnd, self.window_end),
            (Trigger::Report, self.report),
        ]
    }
}

/// Daily cron pattern firing at `t` (minute precision).
pub fn daily_pattern(t: NaiveTime) -> String {
    format!("{} {} * * *", t.minute(), t.hour())
}

/// The earliest firing strictly after `after`, with every trigger due at
/// that same instant in lifecycle order.
pub fn next_fire(
    schedule: &Schedule,
    after: DateTime<Utc>,
    tz: Tz,
) -> Result<(DateTime<Utc>, Vec<Trigger>), RollcallError> {
    let local = after.with_timezone(&tz);
    let mut upcoming = Vec::with_capacity(3);

    for (trigger, at) in schedule.entries() {
        let pattern = daily_pattern(at);
        let cron = Cron::from_str(&pattern).map_err(|e| {
            RollcallError::Internal(format!("bad cron pattern `{pattern}`: {e}"))
        })?;
        let due = cron
            .find_next_occurrence(&local, false)
            .map_err(|e| {
                RollcallError::Internal(format!("no next occurrence for `{pattern}`: {e}"))
            })?
            .with_timezone(&Utc);
        upcoming.push((due, trigger));
    }

    let earliest = upcoming
        .iter()
        .map(|(due, _)| *due)
        .min()
        .ok_or_else(|| RollcallError::Internal("empty schedule".into()))?;
    let triggers = upcoming
        .into_iter()
        .filter(|(due, _)| *due == earliest)
        .map(|(_, trigger)| trigger)
        .collect();
    Ok((earliest, triggers))
}

/// Drives a [`TriggerHandler`] from the effective settings.
pub struct CronScheduler {
    settings: Arc<AttendanceSettings>,
    handler: Arc<dyn TriggerHandler>,
    clock: Arc<dyn Clock>,
    tick: Duration,
}

impl CronScheduler {
    pub fn new(
        settings: Arc<AttendanceSettings>,
        handler: Arc<dyn TriggerHandler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            handler,
            clock,
            tick: DEFAULT_TICK,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Current trigger times from the effective settings.
    pub async fn schedule(&self) -> Result<Schedule, RollcallError> {
        let bounds = self.settings.window().await?;
        Ok(Schedule {
            window_start: bounds.start,
            window_end: bounds.end,
            report: self.settings.report_time().await?,
        })
    }

    /// Run until `cancel` fires.
    ///
    /// Triggers are spawned and not awaited; an in-flight reconciliation
    /// keeps running after cancellation or a later trigger.
    pub async fn run(self, cancel: CancellationToken) {
        let tz = self.settings.timezone();
        // Nothing at or before `cursor` is fired again.
        let mut cursor = self.clock.now();
        info!(%tz, "trigger scheduler started");

        loop {
            let next = match self.schedule().await {
                Ok(schedule) => next_fire(&schedule, cursor, tz),
                Err(e) => Err(e),
            };
            let now = self.clock.now();

            let wait = match next {
                Ok((due, triggers)) if due <= now => {
                    cursor = due;
                    self.dispatch(due, triggers);
                    continue;
                }
                Ok((due, triggers)) => {
                    debug!(?triggers, %due, "next trigger");
                    // Nothing was due in (cursor, now] under this schedule.
                    cursor = now;
                    (due - now).to_std().unwrap_or_default().min(self.tick)
                }
                Err(e) => {
                    warn!(error = %e, "cannot compute schedule, retrying");
                    self.tick
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("trigger scheduler stopped");
    }

    fn dispatch(&self, due: DateTime<Utc>, triggers: Vec<Trigger>) {
        let handler = self.handler.clone();
        tokio::spawn(async move {
            for trigger in triggers {
                info!(%trigger, %due, "trigger fired");
                handler.fire(trigger, due).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    const TZ: Tz = chrono_tz::Asia::Phnom_Penh;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn local(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        TZ.from_local_datetime(
            &NaiveDate::from_ymd_opt(2026, 3, d)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap(),
        )
        .unwrap()
        .with_timezone(&Utc)
    }

    fn schedule() -> Schedule {
        Schedule {
            window_start: hm(9, 0),
            window_end: hm(10, 0),
            report: hm(10, 5),
        }
    }

    #[test]
    fn pattern_is_minute_hour() {
        assert_eq!(daily_pattern(hm(9, 5)), "5 9 * * *");
        assert_eq!(daily_pattern(hm(0, 0)), "0 0 * * *");
    }

    #[test]
    fn next_fire_walks_the_day() {
        let s = schedule();
        let (due, t) = next_fire(&s, local(2, 8, 0, 0), TZ).unwrap();
        assert_eq!((due, t), (local(2, 9, 0, 0), vec![Trigger::WindowStart]));

        let (due, t) = next_fire(&s, due, TZ).unwrap();
        assert_eq!((due, t), (local(2, 10, 0, 0), vec![Trigger::WindowEnd]));

        let (due, t) = next_fire(&s, due, TZ).unwrap();
        assert_eq!((due, t), (local(2, 10, 5, 0), vec![Trigger::Report]));

        let (due, t) = next_fire(&s, due, TZ).unwrap();
        assert_eq!((due, t), (local(3, 9, 0, 0), vec![Trigger::WindowStart]));
    }

    #[test]
    fn simultaneous_triggers_fire_in_lifecycle_order() {
        let s = Schedule {
            report: hm(10, 0),
            ..schedule()
        };
        let (due, t) = next_fire(&s, local(2, 9, 30, 0), TZ).unwrap();
        assert_eq!(due, local(2, 10, 0, 0));
        assert_eq!(t, vec![Trigger::WindowEnd, Trigger::Report]);
    }

    #[test]
    fn next_fire_is_exclusive() {
        let (due, _) = next_fire(&schedule(), local(2, 9, 0, 0), TZ).unwrap();
        assert_eq!(due, local(2, 10, 0, 0));
    }

    #[test]
    fn trigger_names() {
        assert_eq!(Trigger::WindowStart.to_string(), "window_start");
        assert_eq!(Trigger::Report.to_string(), "report");
    }
}
