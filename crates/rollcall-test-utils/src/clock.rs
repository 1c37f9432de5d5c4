// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A clock tests can set and advance.

use arc_swap::ArcSwap;
use chrono::{DateTime, TimeDelta, Utc};
use rollcall_core::Clock;

pub struct ManualClock {
    now: ArcSwap<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: ArcSwap::from_pointee(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.store(now.into());
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.rcu(|now| **now + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        **self.now.load()
    }
}
