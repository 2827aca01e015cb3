// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Cartpulse.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Cartpulse configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CartpulseConfig {
    /// Process identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram delivery settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Carrier (shipment) API settings.
    #[serde(default)]
    pub carrier: CarrierConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Report generation settings.
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Report schedule settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Inbound webhook server settings.
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "cartpulse".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram delivery configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram delivery.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat that receives cart notifications and reports.
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// Carrier API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierConfig {
    /// Base URL of the carrier's external API.
    #[serde(default = "default_carrier_base_url")]
    pub base_url: String,

    /// Login email for the token exchange. `None` means live fetches fail
    /// with an auth error.
    #[serde(default)]
    pub email: Option<String>,

    /// Login password for the token exchange.
    #[serde(default)]
    pub password: Option<String>,

    /// Sales channel to scope order fetches to, when set.
    #[serde(default)]
    pub channel_id: Option<i64>,

    /// Page size for paginated order fetches.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// HTTP timeout for carrier requests, in seconds.
    #[serde(default = "default_carrier_timeout_secs")]
    pub timeout_secs: u64,

    /// Refresh the bearer token this many seconds before its expiry.
    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,

    /// Serve orders from a local fixture instead of the live API.
    #[serde(default)]
    pub use_fixture: bool,

    /// Path to a JSON array of fixture orders (used with `use_fixture`).
    #[serde(default)]
    pub fixture_path: Option<String>,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            base_url: default_carrier_base_url(),
            email: None,
            password: None,
            channel_id: None,
            page_size: default_page_size(),
            timeout_secs: default_carrier_timeout_secs(),
            token_refresh_margin_secs: default_token_refresh_margin_secs(),
            use_fixture: false,
            fixture_path: None,
        }
    }
}

fn default_carrier_base_url() -> String {
    "https://apiv2.shiprocket.in/v1/external".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_carrier_timeout_secs() -> u64 {
    20
}

fn default_token_refresh_margin_secs() -> u64 {
    300
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("cartpulse").join("cartpulse.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("cartpulse.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Report generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportingConfig {
    /// IANA timezone that all report ranges and schedules are interpreted in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Days of history covered by the daily report.
    #[serde(default = "default_daily_lookback")]
    pub daily_lookback_days: u32,

    /// Days of history covered by the weekly report.
    #[serde(default = "default_weekly_lookback")]
    pub weekly_lookback_days: u32,

    /// Days of history covered by the monthly report.
    #[serde(default = "default_monthly_lookback")]
    pub monthly_lookback_days: u32,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            daily_lookback_days: default_daily_lookback(),
            weekly_lookback_days: default_weekly_lookback(),
            monthly_lookback_days: default_monthly_lookback(),
        }
    }
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_daily_lookback() -> u32 {
    1
}

fn default_weekly_lookback() -> u32 {
    7
}

fn default_monthly_lookback() -> u32 {
    30
}

/// Report schedule configuration.
///
/// Times are `"HH:mm"` (24h) in the reporting timezone. Out-of-range
/// components are clamped at parse time, not rejected.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Time of day the daily report fires.
    #[serde(default = "default_daily_time")]
    pub daily_time: String,

    /// Time of day the weekly report fires.
    #[serde(default = "default_weekly_time")]
    pub weekly_time: String,

    /// Day of week for the weekly report, 0-6 (0 = Sunday).
    #[serde(default = "default_weekly_day")]
    pub weekly_day: u8,

    /// Time of day the monthly report fires.
    #[serde(default = "default_monthly_time")]
    pub monthly_time: String,

    /// Day of month for the monthly report, 1-31.
    #[serde(default = "default_monthly_day")]
    pub monthly_day: u8,

    /// How often the scheduler samples the wall clock, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_time: default_daily_time(),
            weekly_time: default_weekly_time(),
            weekly_day: default_weekly_day(),
            monthly_time: default_monthly_time(),
            monthly_day: default_monthly_day(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_daily_time() -> String {
    "09:00".to_string()
}

fn default_weekly_time() -> String {
    "09:10".to_string()
}

fn default_weekly_day() -> u8 {
    1 // Monday
}

fn default_monthly_time() -> String {
    "09:15".to_string()
}

fn default_monthly_day() -> u8 {
    1
}

fn default_poll_interval_secs() -> u64 {
    30
}

/// Inbound webhook server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Host address to bind.
    #[serde(default = "default_webhook_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: default_webhook_host(),
            port: default_webhook_port(),
        }
    }
}

fn default_webhook_host() -> String {
    "127.0.0.1".to_string()
}

fn default_webhook_port() -> u16 {
    3000
}
