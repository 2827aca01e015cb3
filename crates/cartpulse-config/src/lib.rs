// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Cartpulse.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use cartpulse_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Service name: {}", config.agent.name);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AgentConfig, CarrierConfig, CartpulseConfig, ReportingConfig, ScheduleConfig, StorageConfig,
    TelegramConfig, WebhookConfig,
};

use cartpulse_core::CartpulseError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point: Figment merges the file hierarchy
/// and `CARTPULSE_*` env vars, then semantic validation runs over the
/// extracted struct.
pub fn load_and_validate() -> Result<CartpulseConfig, CartpulseError> {
    let config = loader::load_config().map_err(|e| CartpulseError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from an inline TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<CartpulseConfig, CartpulseError> {
    let config = loader::load_config_from_str(toml_content)
        .map_err(|e| CartpulseError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
