// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end attendance scenarios.
//!
//! Each test builds an isolated TestHarness (temp SQLite, mock channel,
//! manual clock) and drives it through the bot router and the window
//! lifecycle the way `rollcall serve` wires them.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rollcall_attendance::{ForcedStatus, Signal};
use rollcall_bot::{AttendanceServices, MessageRouter};
use rollcall_config::AttendanceConfig;
use rollcall_core::{AttendanceStatus, ChannelAdapter, ChatKind, MemberHint, RollcallError};
use rollcall_cron::WindowLifecycle;
use rollcall_test_utils::{TestHarness, inbound, local_instant};

const GROUP: i64 = -1002;
const ADMIN: i64 = 1;
const TZ: chrono_tz::Tz = chrono_tz::Asia::Phnom_Penh;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    local_instant(TZ, day(), h, m, s)
}

async fn harness_with(attendance: AttendanceConfig) -> TestHarness {
    TestHarness::builder()
        .with_attendance(attendance)
        .with_group(GROUP)
        .starting_at(at(8, 0, 0))
        .build()
        .await
        .unwrap()
}

async fn harness() -> TestHarness {
    harness_with(AttendanceConfig::default()).await
}

fn router(h: &TestHarness) -> MessageRouter {
    let services = AttendanceServices {
        ledger: h.ledger.clone(),
        settings: h.settings.clone(),
        processor: h.processor.clone(),
        reconciler: h.reconciler.clone(),
        admin: h.admin.clone(),
        gate: h.gate.clone(),
        clock: h.clock.clone(),
    };
    let channel: Arc<dyn ChannelAdapter> = h.channel.clone();
    MessageRouter::new(services, channel, h.group.clone(), [ADMIN])
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

fn signal(external_id: i64, ts: DateTime<Utc>) -> Signal {
    Signal {
        external_id,
        hint: MemberHint::default(),
        at: ts,
    }
}

/// (member, day) keys must be unique across records and across fines.
async fn assert_unique_per_member_day(h: &TestHarness) {
    let records = h.ledger.list_records(day(), day()).await.unwrap();
    let keys: HashSet<_> = records.iter().map(|r| (r.member_id, r.day)).collect();
    assert_eq!(keys.len(), records.len(), "duplicate attendance records");

    let fines = h.ledger.list_fines(day(), day()).await.unwrap();
    let keys: HashSet<_> = fines.iter().map(|f| (f.member_id, f.day)).collect();
    assert_eq!(keys.len(), fines.len(), "duplicate fines");
}

async fn status_of(h: &TestHarness, external_id: i64) -> Option<AttendanceStatus> {
    let member = h.ledger.find_member(external_id).await.unwrap()?;
    h.ledger
        .get_record(member.id, day())
        .await
        .unwrap()
        .map(|r| r.status)
}

async fn fine_of(h: &TestHarness, external_id: i64) -> Option<f64> {
    let member = h.ledger.find_member(external_id).await.unwrap()?;
    h.ledger
        .get_fine(member.id, day())
        .await
        .unwrap()
        .map(|f| f.amount)
}

// ---- Scenario: one window, three members ----

#[tokio::test]
async fn window_day_scenario() {
    let h = harness().await;
    let r = router(&h);
    let lc = lifecycle(&h);

    // D has been around for a while and never signals.
    h.ledger
        .get_or_create_member(40, &MemberHint::default())
        .await
        .unwrap();

    lc.on_window_start(at(9, 0, 0)).await.unwrap();

    r.handle(inbound(GROUP, ChatKind::Group, 10, "1", at(9, 30, 0))).await;
    r.handle(inbound(GROUP, ChatKind::Group, 20, "1", at(9, 59, 59))).await;
    r.handle(inbound(GROUP, ChatKind::Group, 30, "1", at(10, 0, 0))).await;

    assert_eq!(status_of(&h, 10).await, Some(AttendanceStatus::Present));
    assert_eq!(fine_of(&h, 10).await, None);
    assert_eq!(status_of(&h, 20).await, Some(AttendanceStatus::Present));
    // Rejected at window end: C is not even registered by the signal.
    assert!(h.ledger.find_member(30).await.unwrap().is_none());

    // C registers later the same morning and still gets reconciled.
    h.clock.set(at(9, 59, 0));
    r.handle(inbound(30, ChatKind::Private, 30, "/start", at(9, 59, 0))).await;

    let summary = lc.on_window_end(at(10, 0, 0)).await.unwrap();
    assert_eq!(summary.marked_absent, 2);

    assert_eq!(status_of(&h, 30).await, Some(AttendanceStatus::Absent));
    assert_eq!(fine_of(&h, 30).await, Some(20.0));
    assert_eq!(status_of(&h, 40).await, Some(AttendanceStatus::Absent));
    assert_eq!(fine_of(&h, 40).await, Some(20.0));
    assert_eq!(status_of(&h, 10).await, Some(AttendanceStatus::Present));

    let report = lc.on_report(at(10, 5, 0)).await.unwrap();
    assert_eq!(report.total_members, 4);
    assert_eq!(report.present.len(), 2);
    assert_eq!(report.absent.len(), 2);
    assert!(report.pending.is_empty());

    assert_unique_per_member_day(&h).await;
}

// ---- Property: deadline boundary ----

#[tokio::test]
async fn signal_exactly_at_deadline_is_late() {
    let h = harness_with(AttendanceConfig {
        deadline: Some("09:30".into()),
        ..AttendanceConfig::default()
    })
    .await;
    lifecycle(&h).on_window_start(at(9, 0, 0)).await.unwrap();

    let on_time = h.processor.submit(signal(1, at(9, 29, 59))).await.unwrap();
    let late = h.processor.submit(signal(2, at(9, 30, 0))).await.unwrap();

    assert_eq!(on_time.status, AttendanceStatus::Present);
    assert_eq!(late.status, AttendanceStatus::Late);
    assert_eq!(late.fine, Some(20.0));
    assert_eq!(fine_of(&h, 2).await, Some(20.0));
}

// ---- Property: window end is excluded ----

#[tokio::test]
async fn signal_exactly_at_window_end_is_rejected() {
    let h = harness().await;
    lifecycle(&h).on_window_start(at(9, 0, 0)).await.unwrap();

    let err = h.processor.submit(signal(1, at(10, 0, 0))).await.unwrap_err();
    assert!(matches!(err, RollcallError::WindowClosed));
}

// ---- Property: concurrent first submissions ----

#[tokio::test]
async fn concurrent_first_submissions_yield_one_record() {
    let h = harness().await;
    lifecycle(&h).on_window_start(at(9, 0, 0)).await.unwrap();

    let attempts = (0..8).map(|i| {
        let processor = h.processor.clone();
        tokio::spawn(async move { processor.submit(signal(77, at(9, 10, i))).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(RollcallError::AlreadyRecorded { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(h.ledger.list_members().await.unwrap().len(), 1);
    assert_unique_per_member_day(&h).await;
}

// ---- Property: reconciliation idempotence ----

#[tokio::test]
async fn reconciling_twice_equals_reconciling_once() {
    let h = harness().await;
    lifecycle(&h).on_window_start(at(9, 0, 0)).await.unwrap();
    for id in 1..=4 {
        h.ledger
            .get_or_create_member(id, &MemberHint::default())
            .await
            .unwrap();
    }
    h.processor.submit(signal(1, at(9, 5, 0))).await.unwrap();

    h.reconciler.reconcile(day()).await.unwrap();
    let records_once = h.ledger.list_records(day(), day()).await.unwrap();
    let fines_once = h.ledger.list_fines(day(), day()).await.unwrap();

    let again = h.reconciler.reconcile(day()).await.unwrap();
    assert_eq!(again.marked_absent, 0);
    assert_eq!(h.ledger.list_records(day(), day()).await.unwrap(), records_once);
    assert_eq!(h.ledger.list_fines(day(), day()).await.unwrap(), fines_once);
    assert_eq!(records_once.len(), 4);
    assert_eq!(fines_once.len(), 3);
}

// ---- Property: override wins and is left alone ----

#[tokio::test]
async fn override_replaces_and_survives_reconciliation() {
    let h = harness().await;
    let r = router(&h);
    lifecycle(&h).on_window_start(at(9, 0, 0)).await.unwrap();
    h.processor.submit(signal(5, at(9, 10, 0))).await.unwrap();

    h.clock.set(at(9, 45, 0));
    r.handle(inbound(ADMIN, ChatKind::Private, ADMIN, "/force-mark 5 absent", at(9, 45, 0)))
        .await;
    assert_eq!(status_of(&h, 5).await, Some(AttendanceStatus::Absent));
    assert_eq!(fine_of(&h, 5).await, Some(20.0));

    h.admin.force_mark(5, ForcedStatus::Present, None).await.unwrap();
    assert_eq!(status_of(&h, 5).await, Some(AttendanceStatus::Present));
    assert_eq!(fine_of(&h, 5).await, None);

    let summary = h.reconciler.reconcile(day()).await.unwrap();
    assert_eq!(summary.marked_absent, 0);
    assert_eq!(status_of(&h, 5).await, Some(AttendanceStatus::Present));
    assert_unique_per_member_day(&h).await;
}

// ---- Scenario: fine amount changes between absences ----

#[tokio::test]
async fn fines_keep_the_amount_in_effect_at_creation() {
    let h = harness().await;
    let r = router(&h);
    for id in [61, 62] {
        h.ledger
            .get_or_create_member(id, &MemberHint::default())
            .await
            .unwrap();
    }

    h.admin.force_mark(61, ForcedStatus::Absent, Some(day())).await.unwrap();
    r.handle(inbound(ADMIN, ChatKind::Private, ADMIN, "/setfine 30", at(10, 1, 0))).await;
    h.admin.force_mark(62, ForcedStatus::Absent, Some(day())).await.unwrap();

    assert_eq!(fine_of(&h, 61).await, Some(20.0));
    assert_eq!(fine_of(&h, 62).await, Some(30.0));

    // A later reconciliation does not re-price existing fines.
    h.reconciler.reconcile(day()).await.unwrap();
    assert_eq!(fine_of(&h, 61).await, Some(20.0));
}

// ---- Scenario: mixed operations never break uniqueness ----

#[tokio::test]
async fn mixed_concurrent_operations_keep_one_row_per_member_day() {
    let h = harness().await;
    lifecycle(&h).on_window_start(at(9, 0, 0)).await.unwrap();
    for id in 1..=6 {
        h.ledger
            .get_or_create_member(id, &MemberHint::default())
            .await
            .unwrap();
    }

    let mut tasks = Vec::new();
    for id in 1..=6 {
        let processor = h.processor.clone();
        tasks.push(tokio::spawn(async move {
            let _ = processor.submit(signal(id, at(9, 20, 0))).await;
        }));
        let reconciler = h.reconciler.clone();
        tasks.push(tokio::spawn(async move {
            let _ = reconciler.reconcile(day()).await;
        }));
    }
    let admin = h.admin.clone();
    tasks.push(tokio::spawn(async move {
        let _ = admin.force_mark(3, ForcedStatus::Absent, Some(day())).await;
    }));
    futures::future::join_all(tasks).await;

    assert_unique_per_member_day(&h).await;
    let records = h.ledger.list_records(day(), day()).await.unwrap();
    assert_eq!(records.len(), 6);
    for record in &records {
        let fine = h.ledger.get_fine(record.member_id, day()).await.unwrap();
        assert_eq!(
            fine.is_some(),
            record.status.is_fined(),
            "fine must exist exactly for late or absent records"
        );
    }
}
