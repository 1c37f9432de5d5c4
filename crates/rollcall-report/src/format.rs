// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-message rendering.

use crate::snapshot::{DailyReport, ReportLine};

/// `$20.00` style amount.
pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{currency}{amount:.2}")
}

fn signal_time(line: &ReportLine, report: &DailyReport) -> String {
    line.signal_at
        .map(|ts| ts.with_timezone(&report.timezone).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render the daily report as chat text.
pub fn render_daily_report(
    report: &DailyReport,
    include_running_fines: bool,
    currency: &str,
) -> String {
    let mut lines = vec![
        format!("📊 Daily Attendance Report - {}", report.day.format("%Y-%m-%d")),
        String::new(),
        format!("Total Members: {}", report.total_members),
        String::new(),
        format!("✅ Present Members ({}):", report.present.len()),
    ];
    if report.present.is_empty() {
        lines.push("  none".to_string());
    }
    for line in &report.present {
        lines.push(format!(
            "• {} ({})",
            line.member.display_name(),
            signal_time(line, report)
        ));
    }

    let missed = report.late.len() + report.absent.len();
    lines.push(String::new());
    lines.push(format!("❌ Absent/Late Members ({missed}):"));
    if missed == 0 {
        lines.push("  none".to_string());
    }
    for line in report.late.iter().chain(&report.absent) {
        let when = match line.signal_at {
            Some(_) => format!(" at {}", signal_time(line, report)),
            None => String::new(),
        };
        let fine = line
            .fine
            .map(|f| format!(" - Fine: {}", format_money(f, currency)))
            .unwrap_or_default();
        lines.push(format!(
            "• {} [{}{when}]{fine}",
            line.member.display_name(),
            line.status
        ));
    }

    if !report.pending.is_empty() {
        lines.push(String::new());
        lines.push(format!("⏳ No Record Yet ({}):", report.pending.len()));
        for member in &report.pending {
            lines.push(format!("• {}", member.display_name()));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Fines today: {}",
        format_money(report.fines_for_day(), currency)
    ));

    if include_running_fines {
        lines.push(String::new());
        lines.push("💰 Running Fines:".to_string());
        if report.running_fines.is_empty() {
            lines.push("  none".to_string());
        }
        for (member, total) in &report.running_fines {
            lines.push(format!(
                "• {}: {}",
                member.display_name(),
                format_money(*total, currency)
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rollcall_core::{AttendanceStatus, Member};

    use super::*;

    fn member(id: i64, name: &str) -> Member {
        Member {
            id,
            external_id: 1000 + id,
            username: None,
            full_name: Some(name.to_string()),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn sample() -> DailyReport {
        DailyReport {
            day: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            timezone: chrono_tz::Asia::Phnom_Penh,
            total_members: 4,
            present: vec![ReportLine {
                member: member(1, "Dara"),
                status: AttendanceStatus::Present,
                signal_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 2, 30, 0).unwrap()),
                fine: None,
            }],
            late: vec![ReportLine {
                member: member(2, "Sophea"),
                status: AttendanceStatus::Late,
                signal_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 2, 59, 0).unwrap()),
                fine: Some(20.0),
            }],
            absent: vec![ReportLine {
                member: member(3, "Vannak"),
                status: AttendanceStatus::Absent,
                signal_at: None,
                fine: Some(30.0),
            }],
            pending: vec![member(4, "Kosal")],
            running_fines: vec![(member(3, "Vannak"), 50.0), (member(2, "Sophea"), 20.0)],
        }
    }

    #[test]
    fn renders_sections_in_local_time() {
        let text = render_daily_report(&sample(), false, "$");
        assert!(text.starts_with("📊 Daily Attendance Report - 2026-03-02"));
        assert!(text.contains("Total Members: 4"));
        assert!(text.contains("• Dara (09:30:00)"));
        assert!(text.contains("• Sophea [late at 09:59:00] - Fine: $20.00"));
        assert!(text.contains("• Vannak [absent] - Fine: $30.00"));
        assert!(text.contains("⏳ No Record Yet (1):\n• Kosal"));
        assert!(text.contains("Fines today: $50.00"));
        assert!(!text.contains("Running Fines"));
    }

    #[test]
    fn running_fines_are_optional() {
        let text = render_daily_report(&sample(), true, "KHR ");
        assert!(text.contains("💰 Running Fines:\n• Vannak: KHR 50.00\n• Sophea: KHR 20.00"));
    }

    #[test]
    fn empty_sections_say_none() {
        let mut report = sample();
        report.present.clear();
        report.late.clear();
        report.absent.clear();
        report.pending.clear();
        let text = render_daily_report(&report, false, "$");
        assert!(text.contains("✅ Present Members (0):\n  none"));
        assert!(text.contains("❌ Absent/Late Members (0):\n  none"));
        assert!(!text.contains("No Record Yet"));
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(format_money(20.0, "$"), "$20.00");
        assert_eq!(format_money(2.5, "€"), "€2.50");
    }
}
