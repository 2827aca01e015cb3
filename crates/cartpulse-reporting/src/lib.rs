// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order reporting for Cartpulse.
//!
//! Fetched carrier orders are classified into status buckets, aggregated
//! into period metrics, rendered as a chat report, and scheduled on a
//! wall-clock poll loop. The undelivered subset of each run is re-synced
//! into the sticky seller tracker and notified individually.

pub mod classifier;
pub mod format;
pub mod metrics;
pub mod runner;
pub mod scheduler;

pub use classifier::classify;
pub use format::{format_report, format_undelivered_message};
pub use metrics::{aggregate, BucketTally, OrderSummaryMetrics};
pub use runner::ReportRunner;
pub use scheduler::{PeriodJob, ReportScheduler, ScheduleSpec, TimeOfDay};
