// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cartpulse notification engine.

use thiserror::Error;

/// The primary error type used across all Cartpulse crates.
#[derive(Debug, Error)]
pub enum CartpulseError {
    /// Configuration errors (invalid TOML, missing required fields, bad timezone).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Message sink errors (send failure, edit failure, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Carrier API errors (order fetch failure, malformed response).
    #[error("carrier error: {message}")]
    Carrier {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Carrier authentication failure (missing credentials, login returned no token).
    #[error("carrier auth error: {0}")]
    Auth(String),

    /// Inbound webhook payload rejected at the boundary (missing cart_id, bad shape).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_prefixed() {
        let e = CartpulseError::InvalidPayload("cart_id is required".into());
        assert_eq!(e.to_string(), "invalid payload: cart_id is required");

        let e = CartpulseError::Auth("login did not return a token".into());
        assert!(e.to_string().starts_with("carrier auth error:"));
    }

    #[test]
    fn storage_error_wraps_source() {
        let e = CartpulseError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert!(e.to_string().contains("disk full"));
    }
}
