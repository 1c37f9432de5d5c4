// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window lifecycle and scheduler behaviour against a real ledger.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rollcall_attendance::WindowPhase;
use rollcall_core::{AttendanceStatus, ChannelAdapter, RollcallError};
use rollcall_cron::lifecycle::WINDOW_OPEN_TEXT;
use rollcall_cron::{CronScheduler, Trigger, TriggerHandler, WindowLifecycle};
use rollcall_test_utils::{TestHarness, local_instant};
use tokio_util::sync::CancellationToken;

const GROUP: i64 = -1001;
const TZ: chrono_tz::Tz = chrono_tz::Asia::Phnom_Penh;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    local_instant(TZ, day(), h, m, s)
}

async fn harness(group: Option<i64>) -> TestHarness {
    let mut builder = TestHarness::builder().starting_at(at(8, 0, 0));
    if let Some(id) = group {
        builder = builder.with_group(id);
    }
    builder.build().await.unwrap()
}

fn lifecycle(h: &TestHarness) -> WindowLifecycle {
    let channel: Arc<dyn ChannelAdapter> = h.channel.clone();
    WindowLifecycle::new(
        h.gate.clone(),
        h.settings.clone(),
        h.reconciler.clone(),
        h.ledger.clone(),
        channel,
        h.group.clone(),
    )
}

#[tokio::test]
async fn full_day_cycle() {
    let h = harness(Some(GROUP)).await;
    let lc = lifecycle(&h);

    for id in [1, 2, 3] {
        h.ledger
            .get_or_create_member(id, &Default::default())
            .await
            .unwrap();
    }

    let opened = lc.on_window_start(at(9, 0, 0)).await.unwrap();
    assert_eq!(opened, day());
    assert!(matches!(h.gate.phase(), WindowPhase::Open { day: d, .. } if d == day()));

    h.clock.set(at(9, 20, 0));
    h.signal(1).await.unwrap();

    let summary = lc.on_window_end(at(10, 0, 0)).await.unwrap();
    assert_eq!(summary.day, day());
    assert_eq!(summary.marked_absent, 2);
    assert_eq!(
        h.gate.phase(),
        WindowPhase::Reconciling { day: day() }
    );

    h.clock.set(at(10, 1, 0));
    let late = h.signal(4).await.unwrap_err();
    assert!(matches!(late, RollcallError::WindowClosed));

    let report = lc.on_report(at(10, 5, 0)).await.unwrap();
    assert_eq!(report.present.len(), 1);
    assert_eq!(report.absent.len(), 2);
    assert_eq!(h.gate.phase(), WindowPhase::Reported { day: day() });

    let sent = h.channel.sent_to(GROUP).await;
    assert_eq!(sent.len(), 3);
    assert!(sent[0].starts_with(WINDOW_OPEN_TEXT));
    assert!(sent[1].contains("2 member(s) marked absent"));
    assert!(sent[2].starts_with("📊 Daily Attendance Report - 2026-03-02"));
}

#[tokio::test]
async fn announcements_are_skipped_without_a_group() {
    let h = harness(None).await;
    let lc = lifecycle(&h);
    h.ledger
        .get_or_create_member(1, &Default::default())
        .await
        .unwrap();

    lc.on_window_start(at(9, 0, 0)).await.unwrap();
    let summary = lc.on_window_end(at(10, 0, 0)).await.unwrap();

    assert_eq!(summary.marked_absent, 1);
    assert_eq!(h.channel.sent_count().await, 0);
}

#[tokio::test]
async fn failed_announcements_do_not_undo_reconciliation() {
    let h = harness(Some(GROUP)).await;
    let lc = lifecycle(&h);
    let member = h
        .ledger
        .get_or_create_member(1, &Default::default())
        .await
        .unwrap();
    h.channel.fail_sends(true);

    lc.on_window_start(at(9, 0, 0)).await.unwrap();
    lc.on_window_end(at(10, 0, 0)).await.unwrap();

    let record = h.ledger.get_record(member.id, day()).await.unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::Absent);
    assert_eq!(h.ledger.get_fine(member.id, day()).await.unwrap().unwrap().amount, 20.0);
}

#[tokio::test]
async fn window_end_without_open_reconciles_today() {
    let h = harness(Some(GROUP)).await;
    let lc = lifecycle(&h);
    h.ledger
        .get_or_create_member(1, &Default::default())
        .await
        .unwrap();

    assert_eq!(h.gate.phase(), WindowPhase::Closed);
    let summary = lc.on_window_end(at(10, 0, 0)).await.unwrap();
    assert_eq!(summary.day, day());
    assert_eq!(summary.marked_absent, 1);
    assert_eq!(h.gate.phase(), WindowPhase::Reconciling { day: day() });
}

#[tokio::test]
async fn end_trigger_twice_is_idempotent() {
    let h = harness(None).await;
    let lc = lifecycle(&h);
    h.ledger
        .get_or_create_member(1, &Default::default())
        .await
        .unwrap();

    lc.on_window_start(at(9, 0, 0)).await.unwrap();
    let first = lc.on_window_end(at(10, 0, 0)).await.unwrap();
    let second = lc.on_window_end(at(10, 0, 0)).await.unwrap();
    assert_eq!(first.marked_absent, 1);
    assert_eq!(second.marked_absent, 0);
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn report_inside_the_window_keeps_it_open() {
    let h = harness(Some(GROUP)).await;
    let lc = lifecycle(&h);

    lc.on_window_start(at(9, 0, 0)).await.unwrap();
    lc.on_report(at(9, 30, 0)).await.unwrap();
    assert!(matches!(h.gate.phase(), WindowPhase::Open { day: d, .. } if d == day()));

    h.clock.set(at(9, 45, 0));
    let receipt = h.signal(7).await.unwrap();
    assert_eq!(receipt.status, AttendanceStatus::Present);

    lc.on_window_end(at(10, 0, 0)).await.unwrap();
    lc.on_report(at(10, 5, 0)).await.unwrap();
    assert_eq!(h.gate.phase(), WindowPhase::Reported { day: day() });
}

#[tokio::test]
async fn report_sharing_the_start_time_does_not_close_the_window() {
    let h = harness(None).await;
    let lc = lifecycle(&h);

    lc.fire(Trigger::WindowStart, at(9, 0, 0)).await;
    lc.fire(Trigger::Report, at(9, 0, 0)).await;

    h.clock.set(at(9, 10, 0));
    assert!(h.signal(7).await.is_ok());
}

#[derive(Default)]
struct Recorder {
    fired: Mutex<Vec<(Trigger, DateTime<Utc>)>>,
}

#[async_trait]
impl TriggerHandler for Recorder {
    async fn fire(&self, trigger: Trigger, at: DateTime<Utc>) {
        self.fired.lock().unwrap().push((trigger, at));
    }
}

impl Recorder {
    fn triggers(&self) -> Vec<Trigger> {
        self.fired.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    async fn wait_for(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.fired.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("triggers did not fire");
    }
}

#[tokio::test]
async fn scheduler_fires_due_triggers_from_clock() {
    let h = harness(None).await;
    h.clock.set(at(8, 59, 59));
    let recorder = Arc::new(Recorder::default());
    let handler: Arc<dyn TriggerHandler> = recorder.clone();
    let scheduler = CronScheduler::new(h.settings.clone(), handler, h.clock.clone())
        .with_tick(Duration::from_millis(10));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(recorder.triggers().is_empty());

    h.clock.set(at(9, 0, 0));
    recorder.wait_for(1).await;
    assert_eq!(recorder.triggers(), vec![Trigger::WindowStart]);
    assert_eq!(recorder.fired.lock().unwrap()[0].1, at(9, 0, 0));

    // Jumping past two trigger times fires both, each once.
    h.clock.set(at(10, 5, 30));
    recorder.wait_for(3).await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    let fired = recorder.triggers();
    assert_eq!(fired.len(), 3);
    assert!(fired.contains(&Trigger::WindowEnd));
    assert!(fired.contains(&Trigger::Report));

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn scheduler_does_not_catch_up_missed_triggers() {
    let h = harness(None).await;
    h.clock.set(at(11, 0, 0));
    let recorder = Arc::new(Recorder::default());
    let handler: Arc<dyn TriggerHandler> = recorder.clone();
    let scheduler = CronScheduler::new(h.settings.clone(), handler, h.clock.clone())
        .with_tick(Duration::from_millis(10));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(60)).await;
    cancel.cancel();
    task.await.unwrap();

    assert!(recorder.triggers().is_empty());
}
