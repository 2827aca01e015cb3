// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions implemented by adapter crates.

pub mod sink;

pub use sink::MessageSink;
