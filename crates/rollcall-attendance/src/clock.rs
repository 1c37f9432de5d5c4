// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clock/Window Calculator.
//!
//! Pure functions over instants, times of day and the configured timezone.
//! Every comparison happens on local wall-clock time in that one zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use rollcall_core::RollcallError;

/// Longest DST gap searched when resolving a nonexistent local time.
const MAX_GAP_MINUTES: u32 = 180;

/// Parse an `HH:MM` time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, RollcallError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        RollcallError::InvalidInput(format!("`{value}` is not a valid HH:MM time"))
    })
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, RollcallError> {
    name.parse::<Tz>()
        .map_err(|_| RollcallError::Config(format!("unknown timezone `{name}`")))
}

pub fn to_local(ts: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    ts.with_timezone(&tz)
}

/// The calendar day `ts` falls on in `tz`.
pub fn local_day(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    to_local(ts, tz).date_naive()
}

/// Interpret a naive timestamp as wall-clock time in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap move forward to the first valid instant.
pub fn assume_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    let mut probe = naive;
    for _ in 0..=MAX_GAP_MINUTES {
        if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
            return dt.with_timezone(&Utc);
        }
        probe += TimeDelta::minutes(1);
    }
    naive.and_utc()
}

/// `start <= local(now) < end`.
pub fn window_open(now: DateTime<Utc>, start: NaiveTime, end: NaiveTime, tz: Tz) -> bool {
    let t = to_local(now, tz).time();
    start <= t && t < end
}

/// `local(ts) < deadline`. A signal exactly at the deadline is late.
pub fn is_before_deadline(ts: DateTime<Utc>, deadline: NaiveTime, tz: Tz) -> bool {
    to_local(ts, tz).time() < deadline
}

/// Effective daily window: `[start, end)` with an on-time cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub deadline: NaiveTime,
}

impl WindowBounds {
    /// Build bounds, rejecting an empty or inverted window.
    pub fn new(
        start: NaiveTime,
        end: NaiveTime,
        deadline: NaiveTime,
    ) -> Result<Self, RollcallError> {
        if start >= end {
            return Err(RollcallError::InvalidInput(format!(
                "window start {} must be earlier than window end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self {
            start,
            end,
            deadline,
        })
    }

    pub fn contains(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        window_open(now, self.start, self.end, tz)
    }

    pub fn is_on_time(&self, ts: DateTime<Utc>, tz: Tz) -> bool {
        is_before_deadline(ts, self.deadline, tz)
    }

    /// The instant the window for local `day` opens.
    pub fn opens_at(&self, day: NaiveDate, tz: Tz) -> DateTime<Utc> {
        assume_local(day.and_time(self.start), tz)
    }

    /// The instant the window for local `day` stops accepting signals.
    pub fn closes_at(&self, day: NaiveDate, tz: Tz) -> DateTime<Utc> {
        assume_local(day.and_time(self.end), tz)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use proptest::prelude::*;

    use super::*;

    const PHNOM_PENH: Tz = chrono_tz::Asia::Phnom_Penh;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn pp(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        assume_local(
            NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap(),
            PHNOM_PENH,
        )
    }

    #[test]
    fn window_is_half_open() {
        let (start, end) = (hm(9, 0), hm(10, 0));
        assert!(window_open(pp(9, 0, 0), start, end, PHNOM_PENH));
        assert!(window_open(pp(9, 59, 59), start, end, PHNOM_PENH));
        assert!(!window_open(pp(10, 0, 0), start, end, PHNOM_PENH));
        assert!(!window_open(pp(8, 59, 59), start, end, PHNOM_PENH));
    }

    #[test]
    fn deadline_is_strict() {
        let deadline = hm(10, 0);
        assert!(is_before_deadline(pp(9, 59, 59), deadline, PHNOM_PENH));
        assert!(!is_before_deadline(pp(10, 0, 0), deadline, PHNOM_PENH));
    }

    #[test]
    fn utc_input_is_normalized_to_zone() {
        // 02:30 UTC is 09:30 in Phnom Penh (UTC+7).
        let ts = Utc.with_ymd_and_hms(2026, 3, 2, 2, 30, 0).unwrap();
        assert!(window_open(ts, hm(9, 0), hm(10, 0), PHNOM_PENH));
        assert_eq!(to_local(ts, PHNOM_PENH).hour(), 9);
    }

    #[test]
    fn local_day_crosses_utc_midnight() {
        // 20:00 UTC on the 1st is 03:00 on the 2nd in Phnom Penh.
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        assert_eq!(
            local_day(ts, PHNOM_PENH),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
    }

    #[test]
    fn dst_gap_resolves_forward() {
        let berlin: Tz = chrono_tz::Europe::Berlin;
        // 2026-03-29 02:30 does not exist in Berlin; clocks jump 02:00 -> 03:00 CEST.
        let naive = NaiveDate::from_ymd_opt(2026, 3, 29)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = assume_local(naive, berlin);
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 3, 29, 1, 0, 0).unwrap());
    }

    #[test]
    fn parse_time_of_day_rejects_garbage() {
        assert_eq!(parse_time_of_day("09:30").unwrap(), hm(9, 30));
        assert!(matches!(
            parse_time_of_day("nine"),
            Err(RollcallError::InvalidInput(_))
        ));
    }

    #[test]
    fn bounds_reject_inverted_window() {
        assert!(WindowBounds::new(hm(10, 0), hm(9, 0), hm(9, 0)).is_err());
        assert!(WindowBounds::new(hm(9, 0), hm(9, 0), hm(9, 0)).is_err());
    }

    #[test]
    fn closes_at_is_local_end() {
        let bounds = WindowBounds::new(hm(9, 0), hm(10, 0), hm(10, 0)).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(
            bounds.closes_at(day, PHNOM_PENH),
            Utc.with_ymd_and_hms(2026, 3, 2, 3, 0, 0).unwrap()
        );
        assert_eq!(
            bounds.opens_at(day, PHNOM_PENH),
            Utc.with_ymd_and_hms(2026, 3, 2, 2, 0, 0).unwrap()
        );
    }

    proptest! {
        #[test]
        fn open_iff_between_bounds(
            start_min in 0u32..1439,
            len in 1u32..600,
            probe_secs in 0u32..86_400,
        ) {
            let end_min = (start_min + len).min(1439);
            prop_assume!(end_min > start_min);
            let start = hm(start_min / 60, start_min % 60);
            let end = hm(end_min / 60, end_min % 60);
            let probe = NaiveTime::from_num_seconds_from_midnight_opt(probe_secs, 0).unwrap();
            let now = assume_local(
                NaiveDate::from_ymd_opt(2026, 6, 1).unwrap().and_time(probe),
                PHNOM_PENH,
            );
            prop_assert_eq!(
                window_open(now, start, end, PHNOM_PENH),
                start <= probe && probe < end
            );
        }

        #[test]
        fn on_time_never_at_or_after_deadline(
            deadline_min in 0u32..1440,
            probe_secs in 0u32..86_400,
        ) {
            let deadline = hm(deadline_min / 60, deadline_min % 60);
            let probe = NaiveTime::from_num_seconds_from_midnight_opt(probe_secs, 0).unwrap();
            let ts = assume_local(
                NaiveDate::from_ymd_opt(2026, 6, 1).unwrap().and_time(probe),
                PHNOM_PENH,
            );
            prop_assert_eq!(is_before_deadline(ts, deadline, PHNOM_PENH), probe < deadline);
        }
    }
}
