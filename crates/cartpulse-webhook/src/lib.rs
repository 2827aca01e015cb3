// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound cart webhook handling for Cartpulse.
//!
//! Events arrive over HTTP, are validated into typed payloads, classified
//! by richness, and reconciled against the stored cart state to decide
//! whether a notification is sent, edited in place, or suppressed.

pub mod event;
pub mod format;
pub mod reconciler;
pub mod server;

pub use event::{CartEventPayload, CartItem};
pub use reconciler::{NotificationReconciler, ReconcileAction, ReconcileDecision, decide};
pub use server::{WebhookState, build_router, start_server};
