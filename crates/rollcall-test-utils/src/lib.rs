// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Rollcall integration tests.
//!
//! - [`MockChannel`] - messaging channel with message injection and capture
//! - [`ManualClock`] - settable clock
//! - [`TestHarness`] - attendance services over a temp SQLite ledger

pub mod clock;
pub mod harness;
pub mod mock_channel;

pub use clock::ManualClock;
pub use harness::{TestHarness, inbound, local_instant};
pub use mock_channel::MockChannel;
