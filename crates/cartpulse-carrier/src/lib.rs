// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier API client for Cartpulse.
//!
//! Handles bearer-token authentication against the carrier's login
//! endpoint, paginated order fetches over a date range, and an in-memory
//! fixture mode that mirrors the live filter semantics.

pub mod client;
pub mod token;
pub mod types;

pub use client::CarrierClient;
pub use token::TokenManager;
pub use types::{CarrierOrder, OrderAddress, OrderProduct, OrderQuery, OrderShipment};
