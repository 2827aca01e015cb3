// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./cartpulse.toml` > `~/.config/cartpulse/cartpulse.toml`
//! > `/etc/cartpulse/cartpulse.toml` with environment variable overrides via
//! `CARTPULSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CartpulseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cartpulse/cartpulse.toml` (system-wide)
/// 3. `~/.config/cartpulse/cartpulse.toml` (user XDG config)
/// 4. `./cartpulse.toml` (local directory)
/// 5. `CARTPULSE_*` environment variables
pub fn load_config() -> Result<CartpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CartpulseConfig::default()))
        .merge(Toml::file("/etc/cartpulse/cartpulse.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("cartpulse/cartpulse.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("cartpulse.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<CartpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CartpulseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CartpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CartpulseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CARTPULSE_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("CARTPULSE_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: CARTPULSE_CARRIER_PAGE_SIZE -> "carrier_page_size"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("carrier_", "carrier.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("reporting_", "reporting.", 1)
            .replacen("schedule_", "schedule.", 1)
            .replacen("webhook_", "webhook.", 1);
        mapped.into()
    })
}
