// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Cartpulse.
//!
//! Provides WAL-mode SQLite storage with inline schema initialization, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed stores
//! for cart records and undelivered orders.

pub mod carts;
pub mod database;
pub mod undelivered;

pub use carts::{CartEventFields, CartRecord, CartStore};
pub use database::Database;
pub use undelivered::{UndeliveredOrderFields, UndeliveredOrderRecord, UndeliveredOrderStore};
