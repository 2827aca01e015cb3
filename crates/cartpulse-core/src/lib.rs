// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Cartpulse notification engine.
//!
//! This crate provides the workspace-wide error type, the domain types
//! shared between the webhook, carrier, and reporting crates, and the
//! [`MessageSink`] trait implemented by chat adapters.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CartpulseError;
pub use traits::MessageSink;
pub use types::{
    ContactStatus, InlineButton, InlineKeyboard, MessageId, OutboundMessage, ReportPeriod,
    Richness, StatusBucket,
};
