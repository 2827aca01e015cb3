// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for values Figment cannot check.

use cartpulse_core::CartpulseError;

use crate::model::CartpulseConfig;

/// Validate semantic constraints after deserialization.
///
/// Figment handles types and unknown keys; this catches values that are
/// well-typed but unusable, like a timezone chrono-tz does not know.
pub fn validate_config(config: &CartpulseConfig) -> Result<(), CartpulseError> {
    if config.reporting.timezone.parse::<chrono_tz::Tz>().is_err() {
        return Err(CartpulseError::Config(format!(
            "reporting.timezone: unknown IANA timezone '{}'",
            config.reporting.timezone
        )));
    }

    if config.carrier.page_size == 0 {
        return Err(CartpulseError::Config(
            "carrier.page_size: must be at least 1".to_string(),
        ));
    }

    if config.schedule.poll_interval_secs == 0 {
        return Err(CartpulseError::Config(
            "schedule.poll_interval_secs: must be at least 1".to_string(),
        ));
    }

    if config.carrier.use_fixture && config.carrier.fixture_path.is_none() {
        return Err(CartpulseError::Config(
            "carrier.fixture_path: required when carrier.use_fixture is true".to_string(),
        ));
    }

    for (key, time) in [
        ("schedule.daily_time", &config.schedule.daily_time),
        ("schedule.weekly_time", &config.schedule.weekly_time),
        ("schedule.monthly_time", &config.schedule.monthly_time),
    ] {
        if !looks_like_time(time) {
            return Err(CartpulseError::Config(format!(
                "{key}: expected \"HH:mm\", got '{time}'"
            )));
        }
    }

    Ok(())
}

/// Accepts `"HH:mm"` shapes. Component ranges are clamped later by the
/// scheduler, so only the shape is checked here.
fn looks_like_time(value: &str) -> bool {
    let mut parts = value.splitn(2, ':');
    let (Some(hours), Some(minutes)) = (parts.next(), parts.next()) else {
        return false;
    };
    !hours.is_empty()
        && !minutes.is_empty()
        && hours.chars().all(|c| c.is_ascii_digit())
        && minutes.chars().all(|c| c.is_ascii_digit())
}
