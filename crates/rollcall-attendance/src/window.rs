// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared window state cell.
//!
//! `WindowGate` is the single authority on whether signals are accepted.
//! The lifecycle controller writes it; the submission path reads it. The
//! clock-only calculation is used once, to seed the phase at startup.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::clock::{WindowBounds, local_day};

/// Where today's window is in its daily cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// No window has opened since startup, or the previous cycle finished.
    Closed,
    /// Accepting signals for `day` strictly before `closes_at`.
    Open {
        day: NaiveDate,
        closes_at: DateTime<Utc>,
    },
    /// Window for `day` closed; absences are being backfilled.
    Reconciling { day: NaiveDate },
    /// The report for `day` has been sent.
    Reported { day: NaiveDate },
}

/// Synchronized window phase shared by the lifecycle controller and the
/// submission path.
#[derive(Debug)]
pub struct WindowGate {
    phase: ArcSwap<WindowPhase>,
}

impl Default for WindowGate {
    fn default() -> Self {
        Self::new(WindowPhase::Closed)
    }
}

impl WindowGate {
    pub fn new(phase: WindowPhase) -> Self {
        Self {
            phase: ArcSwap::from_pointee(phase),
        }
    }

    /// Seed the phase from the clock for a process starting mid-cycle.
    ///
    /// Only used before the first scheduled trigger fires.
    pub fn bootstrap(now: DateTime<Utc>, bounds: &WindowBounds, tz: Tz) -> Self {
        let phase = if bounds.contains(now, tz) {
            let day = local_day(now, tz);
            WindowPhase::Open {
                day,
                closes_at: bounds.closes_at(day, tz),
            }
        } else {
            WindowPhase::Closed
        };
        info!(?phase, "window phase bootstrapped from clock");
        Self::new(phase)
    }

    pub fn phase(&self) -> WindowPhase {
        **self.phase.load()
    }

    /// The day a signal at `at` counts for, or `None` if it is not accepted.
    pub fn accepts(&self, at: DateTime<Utc>) -> Option<NaiveDate> {
        match self.phase() {
            WindowPhase::Open { day, closes_at } if at < closes_at => Some(day),
            _ => None,
        }
    }

    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        self.accepts(at).is_some()
    }

    /// Open the window for `day` until `closes_at`.
    pub fn open(&self, day: NaiveDate, closes_at: DateTime<Utc>) {
        self.phase.store(Arc::new(WindowPhase::Open { day, closes_at }));
        debug!(%day, %closes_at, "window opened");
    }

    /// Atomically stop accepting signals.
    ///
    /// Returns the day that was open, moving the phase to `Reconciling`, or
    /// `None` (phase unchanged) if no window was open.
    pub fn close(&self) -> Option<NaiveDate> {
        let previous = self.phase.rcu(|phase| match **phase {
            WindowPhase::Open { day, .. } => WindowPhase::Reconciling { day },
            other => other,
        });
        match *previous {
            WindowPhase::Open { day, .. } => {
                debug!(%day, "window closed");
                Some(day)
            }
            _ => None,
        }
    }

    /// Enter `Reconciling` for `day` without an open window, e.g. after a
    /// restart between window start and end triggers.
    pub fn begin_reconciling(&self, day: NaiveDate) {
        self.phase.store(Arc::new(WindowPhase::Reconciling { day }));
    }

    /// Record that the report for `day` went out.
    ///
    /// An open window is left open: only the start and end triggers move
    /// the gate in or out of `Open`. Returns whether the phase changed.
    pub fn mark_reported(&self, day: NaiveDate) -> bool {
        let previous = self.phase.rcu(|phase| match **phase {
            open @ WindowPhase::Open { .. } => open,
            _ => WindowPhase::Reported { day },
        });
        let changed = !matches!(*previous, WindowPhase::Open { .. });
        if !changed {
            debug!(%day, "report sent while the window is open, phase kept");
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone};

    use super::*;

    const TZ: Tz = chrono_tz::Asia::Phnom_Penh;

    fn bounds() -> WindowBounds {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        WindowBounds::new(hm(9, 0), hm(10, 0), hm(10, 0)).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn closed_gate_accepts_nothing() {
        let gate = WindowGate::default();
        assert_eq!(gate.accepts(Utc::now()), None);
    }

    #[test]
    fn open_gate_accepts_strictly_before_close() {
        let gate = WindowGate::default();
        let closes_at = bounds().closes_at(day(), TZ);
        gate.open(day(), closes_at);

        assert_eq!(gate.accepts(closes_at - chrono::TimeDelta::seconds(1)), Some(day()));
        assert_eq!(gate.accepts(closes_at), None);
    }

    #[test]
    fn close_returns_open_day_once() {
        let gate = WindowGate::default();
        gate.open(day(), bounds().closes_at(day(), TZ));

        assert_eq!(gate.close(), Some(day()));
        assert_eq!(gate.phase(), WindowPhase::Reconciling { day: day() });
        assert_eq!(gate.close(), None);
        assert_eq!(gate.phase(), WindowPhase::Reconciling { day: day() });
    }

    #[test]
    fn bootstrap_follows_clock() {
        // 02:30 UTC = 09:30 local.
        let inside = Utc.with_ymd_and_hms(2026, 3, 2, 2, 30, 0).unwrap();
        let gate = WindowGate::bootstrap(inside, &bounds(), TZ);
        assert!(matches!(gate.phase(), WindowPhase::Open { day: d, .. } if d == day()));

        let outside = Utc.with_ymd_and_hms(2026, 3, 2, 3, 0, 0).unwrap();
        let gate = WindowGate::bootstrap(outside, &bounds(), TZ);
        assert_eq!(gate.phase(), WindowPhase::Closed);
    }

    #[test]
    fn reporting_never_closes_an_open_window() {
        let gate = WindowGate::default();
        let closes_at = bounds().closes_at(day(), TZ);
        gate.open(day(), closes_at);

        assert!(!gate.mark_reported(day()));
        assert!(matches!(gate.phase(), WindowPhase::Open { .. }));
        assert_eq!(gate.accepts(closes_at - chrono::TimeDelta::minutes(15)), Some(day()));

        gate.close();
        assert!(gate.mark_reported(day()));
        assert_eq!(gate.phase(), WindowPhase::Reported { day: day() });
    }

    #[test]
    fn reported_phase_rejects_signals() {
        let gate = WindowGate::default();
        gate.mark_reported(day());
        assert!(!gate.is_open(Utc::now()));
    }
}
