// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot and export tests over a populated ledger.

use chrono::{NaiveDate, TimeZone, Utc};
use rollcall_config::StorageConfig;
use rollcall_core::{AttendanceStatus, LedgerStore, MemberHint, NewRecord};
use rollcall_report::{DailyReport, export_daily_csv, export_monthly_csv, render_daily_report};
use rollcall_storage::SqliteLedger;
use tempfile::TempDir;

const TZ: chrono_tz::Tz = chrono_tz::Asia::Phnom_Penh;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

/// Dara present, Sophea late, Vannak absent on the 2nd; Kosal has no record.
/// Vannak was also absent on the 3rd, and Mealea (inactive) was late on the 2nd.
async fn populated() -> (SqliteLedger, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        database_path: dir.path().join("ledger.db").to_string_lossy().into_owned(),
        ..StorageConfig::default()
    };
    let ledger = SqliteLedger::open(storage).await.unwrap();

    let mut ids = Vec::new();
    for (external_id, name) in [
        (101, "Dara"),
        (102, "Sophea"),
        (103, "Vannak"),
        (104, "Kosal"),
        (105, "Mealea"),
    ] {
        let hint = MemberHint {
            username: Some(name.to_lowercase()),
            full_name: Some(name.to_string()),
        };
        ids.push(ledger.get_or_create_member(external_id, &hint).await.unwrap().id);
    }

    let writes = [
        (ids[0], day(2), AttendanceStatus::Present, Some((2, 30)), None),
        (ids[1], day(2), AttendanceStatus::Late, Some((2, 59)), Some(20.0)),
        (ids[2], day(2), AttendanceStatus::Absent, None, Some(20.0)),
        (ids[2], day(3), AttendanceStatus::Absent, None, Some(30.0)),
        (ids[4], day(2), AttendanceStatus::Late, Some((2, 45)), Some(20.0)),
    ];
    for (member_id, d, status, hm, fine) in writes {
        ledger
            .try_create_record(NewRecord {
                member_id,
                day: d,
                status,
                signal_at: hm.map(|(h, m)| {
                    Utc.from_utc_datetime(&d.and_hms_opt(h, m, 0).unwrap())
                }),
                fine,
            })
            .await
            .unwrap();
    }
    ledger.set_member_active(105, false).await.unwrap();
    (ledger, dir)
}

#[tokio::test]
async fn daily_report_groups_active_members() {
    let (ledger, _dir) = populated().await;
    let report = DailyReport::build(&ledger, TZ, day(2)).await.unwrap();

    assert_eq!(report.total_members, 4);
    assert_eq!(report.present.len(), 1);
    assert_eq!(report.late.len(), 1);
    assert_eq!(report.absent.len(), 1);
    assert_eq!(report.pending.len(), 1);
    assert_eq!(report.pending[0].external_id, 104);
    assert_eq!(report.fines_for_day(), 40.0);

    let (top, total) = &report.running_fines[0];
    assert_eq!(top.external_id, 103);
    assert_eq!(*total, 50.0);

    let text = render_daily_report(&report, true, "$");
    assert!(text.contains("• Dara (09:30:00)"));
    assert!(text.contains("• Vannak: $50.00"));
    assert!(!text.contains("Mealea"));
}

#[tokio::test]
async fn daily_csv_lists_records_then_pending() {
    let (ledger, _dir) = populated().await;
    let file = export_daily_csv(&ledger, TZ, day(2)).await.unwrap();
    assert_eq!(file.file_name, "attendance_20260302.csv");

    let text = String::from_utf8(file.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "Date,Member ID,Username,Full Name,Status,Timestamp,Fine Amount"
    );
    assert!(lines.contains(&"2026-03-02,101,dara,Dara,present,09:30:00,0.00"));
    assert!(lines.contains(&"2026-03-02,102,sophea,Sophea,late,09:59:00,20.00"));
    assert!(lines.contains(&"2026-03-02,103,vannak,Vannak,absent,,20.00"));
    assert!(lines.contains(&"2026-03-02,105,mealea,Mealea,late,09:45:00,20.00"));
    assert_eq!(lines.last(), Some(&"2026-03-02,104,kosal,Kosal,pending,,0.00"));
}

#[tokio::test]
async fn monthly_csv_counts_statuses_and_fines() {
    let (ledger, _dir) = populated().await;
    let file = export_monthly_csv(&ledger, 2026, 3).await.unwrap();
    assert_eq!(file.file_name, "attendance_2026_03.csv");

    let text = String::from_utf8(file.bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Month,Member ID,Username,Full Name,Present Days,Late Days,Absent Days,Total Fines",
            "2026-03,101,dara,Dara,1,0,0,0.00",
            "2026-03,102,sophea,Sophea,0,1,0,20.00",
            "2026-03,103,vannak,Vannak,0,0,2,50.00",
            "2026-03,104,kosal,Kosal,0,0,0,0.00",
            "2026-03,105,mealea,Mealea,0,1,0,20.00",
        ]
    );
}

#[tokio::test]
async fn monthly_csv_omits_inactive_members_without_activity() {
    let (ledger, _dir) = populated().await;
    let file = export_monthly_csv(&ledger, 2026, 4).await.unwrap();
    let text = String::from_utf8(file.bytes).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(!text.contains("Mealea"));
}
