// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Transport and storage adapters extend the [`PluginAdapter`] base trait and
//! use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod clock;
pub mod ledger;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use clock::{Clock, SystemClock};
pub use ledger::LedgerStore;
