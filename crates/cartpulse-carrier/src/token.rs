// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer token lifecycle for the carrier API.
//!
//! The carrier issues JWT bearer tokens from a credential login exchange.
//! [`TokenManager`] caches the current token, decodes its `exp` claim to
//! learn the expiry, and transparently re-logs-in when the token is within
//! the refresh margin of expiring. A token whose expiry cannot be decoded
//! is treated as already stale.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cartpulse_core::CartpulseError;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct TokenState {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Manages the carrier bearer token, refreshing it before expiry.
pub struct TokenManager {
    base_url: String,
    email: Option<String>,
    password: Option<String>,
    refresh_margin: Duration,
    http: reqwest::Client,
    state: Mutex<Option<TokenState>>,
}

impl TokenManager {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        email: Option<String>,
        password: Option<String>,
        refresh_margin_secs: u64,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            email,
            password,
            refresh_margin: Duration::seconds(refresh_margin_secs as i64),
            http,
            state: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, logging in first if the cached token
    /// is missing or within the refresh margin of its expiry.
    pub async fn bearer(&self) -> Result<String, CartpulseError> {
        let mut state = self.state.lock().await;

        let stale = match state.as_ref() {
            None => true,
            Some(s) => match s.expires_at {
                // Undecodable expiry is treated as already expired.
                None => true,
                Some(expires_at) => Utc::now() >= expires_at - self.refresh_margin,
            },
        };

        if !stale {
            // Checked stale above, so the token is present.
            if let Some(s) = state.as_ref() {
                return Ok(s.token.clone());
            }
        }

        let token = self.login().await?;
        let expires_at = decode_expiry(&token);
        if expires_at.is_none() {
            warn!("carrier token has no decodable expiry, will re-login on next use");
        }
        *state = Some(TokenState {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }

    async fn login(&self) -> Result<String, CartpulseError> {
        let (Some(email), Some(password)) = (self.email.as_deref(), self.password.as_deref())
        else {
            return Err(CartpulseError::Auth(
                "carrier credentials are missing; set carrier.email and carrier.password".into(),
            ));
        };

        debug!("logging in to carrier API");
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| CartpulseError::Auth(format!("carrier login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CartpulseError::Auth(format!(
                "carrier login returned {status}: {body}"
            )));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| CartpulseError::Auth(format!("carrier login response unreadable: {e}")))?;

        body.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CartpulseError::Auth("carrier login did not return a token".into()))
    }
}

/// Decodes the `exp` claim of a JWT. Returns None for anything that is not
/// a well-formed token with a numeric `exp`.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}
