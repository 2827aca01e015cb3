// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order fetching against the carrier API, live or from a fixture.
//!
//! Live mode pages through `GET /orders` until the upstream reports no
//! further pages or returns a short page. Fixture mode applies the same
//! filter semantics in-memory against a static order set, which also makes
//! report runs testable without network access.

use std::time::Duration;

use cartpulse_config::model::CarrierConfig;
use cartpulse_core::CartpulseError;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::token::TokenManager;
use crate::types::{CarrierOrder, OrderQuery, OrdersPage};

/// Client over the carrier orders API.
pub struct CarrierClient {
    inner: Inner,
}

enum Inner {
    Live(LiveClient),
    Fixture(FixtureClient),
}

struct LiveClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenManager,
    page_size: u32,
    channel_id: Option<i64>,
}

struct FixtureClient {
    orders: Vec<CarrierOrder>,
    channel_id: Option<i64>,
}

impl CarrierClient {
    /// Builds a client from configuration: live against `base_url`, or
    /// fixture-backed when `use_fixture` is set.
    pub fn from_config(config: &CarrierConfig) -> Result<Self, CartpulseError> {
        if config.use_fixture {
            let path = config.fixture_path.as_deref().ok_or_else(|| {
                CartpulseError::Config(
                    "carrier.fixture_path is required when carrier.use_fixture is true".into(),
                )
            })?;
            let raw = std::fs::read_to_string(path).map_err(|e| {
                CartpulseError::Config(format!("cannot read carrier fixture {path}: {e}"))
            })?;
            let orders: Vec<CarrierOrder> = serde_json::from_str(&raw).map_err(|e| {
                CartpulseError::Config(format!("cannot parse carrier fixture {path}: {e}"))
            })?;
            info!(count = orders.len(), path, "carrier client in fixture mode");
            return Ok(Self::fixture_with_channel(orders, config.channel_id));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CartpulseError::Carrier {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let token = TokenManager::new(
            http.clone(),
            config.base_url.clone(),
            config.email.clone(),
            config.password.clone(),
            config.token_refresh_margin_secs,
        );

        Ok(Self {
            inner: Inner::Live(LiveClient {
                http,
                base_url: config.base_url.clone(),
                token,
                page_size: config.page_size,
                channel_id: config.channel_id,
            }),
        })
    }

    /// A fixture-backed client over the given orders. Test use.
    pub fn fixture(orders: Vec<CarrierOrder>) -> Self {
        Self::fixture_with_channel(orders, None)
    }

    fn fixture_with_channel(orders: Vec<CarrierOrder>, channel_id: Option<i64>) -> Self {
        Self {
            inner: Inner::Fixture(FixtureClient { orders, channel_id }),
        }
    }

    /// Fetches all orders in the closed date interval `[start, end]`.
    ///
    /// Any upstream failure aborts the whole fetch; no partial result is
    /// returned.
    pub async fn fetch_orders(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        query: &OrderQuery,
    ) -> Result<Vec<CarrierOrder>, CartpulseError> {
        match &self.inner {
            Inner::Live(live) => live.fetch_orders(start, end, query).await,
            Inner::Fixture(fixture) => Ok(fixture.apply_filters(query)),
        }
    }
}

impl LiveClient {
    async fn fetch_orders(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        query: &OrderQuery,
    ) -> Result<Vec<CarrierOrder>, CartpulseError> {
        let bearer = self.token.bearer().await?;
        let start_str = start.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();
        let per_page = query.per_page.unwrap_or(self.page_size);
        let channel_id = query.channel_id.or(self.channel_id);

        let mut orders = Vec::new();
        let mut page = query.page.unwrap_or(1);

        loop {
            let mut params: Vec<(&str, String)> = vec![
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                // The upstream accepts several names for the date range
                // depending on endpoint version; send all of them.
                ("from", start_str.clone()),
                ("to", end_str.clone()),
                ("start_date", start_str.clone()),
                ("end_date", end_str.clone()),
                ("from_date", start_str.clone()),
                ("to_date", end_str.clone()),
            ];
            if let Some(ref sort) = query.sort {
                params.push(("sort", sort.clone()));
            }
            if let Some(ref sort_by) = query.sort_by {
                params.push(("sort_by", sort_by.clone()));
            }
            if let Some(ref filter_by) = query.filter_by {
                params.push(("filter_by", filter_by.clone()));
            }
            if let Some(ref filter) = query.filter {
                params.push(("filter", filter.clone()));
            }
            if let Some(ref search) = query.search {
                params.push(("search", search.clone()));
            }
            if let Some(ref pickup) = query.pickup_location {
                params.push(("pickup_location", pickup.clone()));
            }
            if let Some(channel_id) = channel_id {
                params.push(("channel_id", channel_id.to_string()));
            }
            if let Some(fbs) = query.fbs {
                params.push(("fbs", fbs.to_string()));
            }

            let response = self
                .http
                .get(format!("{}/orders", self.base_url))
                .bearer_auth(&bearer)
                .query(&params)
                .send()
                .await
                .map_err(|e| CartpulseError::Carrier {
                    message: format!("order fetch request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CartpulseError::Carrier {
                    message: format!("order fetch returned {status}: {body}"),
                    source: None,
                });
            }

            let body: OrdersPage = response.json().await.map_err(|e| CartpulseError::Carrier {
                message: format!("order fetch response unreadable: {e}"),
                source: Some(Box::new(e)),
            })?;

            let page_len = body.data.len();
            debug!(page, page_len, "fetched orders page");
            orders.extend(body.data);

            let Some(pagination) = body.meta.and_then(|m| m.pagination) else {
                break;
            };
            let total_pages = pagination.total_pages.unwrap_or({
                if (page_len as u32) < per_page {
                    page
                } else {
                    page + 1
                }
            });
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(orders)
    }
}

impl FixtureClient {
    /// Mirrors the live API's filter semantics over the in-memory set.
    fn apply_filters(&self, query: &OrderQuery) -> Vec<CarrierOrder> {
        let mut filtered: Vec<CarrierOrder> = self.orders.clone();

        if let (Some(filter_by), Some(filter)) = (&query.filter_by, &query.filter) {
            let wanted = filter.to_uppercase();
            filtered.retain(|order| {
                let value = match filter_by.as_str() {
                    "status" => order.status_text().to_string(),
                    "payment_method" => order.payment_method.clone().unwrap_or_default(),
                    "channel_order_id" => order.channel_order_id.clone().unwrap_or_default(),
                    _ => return true,
                };
                value.to_uppercase() == wanted
            });
        }

        if let Some(ref search) = query.search {
            let term = search.to_uppercase();
            filtered.retain(|order| {
                order
                    .channel_order_id
                    .as_deref()
                    .is_some_and(|v| v.to_uppercase().contains(&term))
                    || order
                        .awb()
                        .is_some_and(|v| v.to_uppercase().contains(&term))
            });
        }

        if let Some(ref pickup) = query.pickup_location {
            let term = pickup.to_uppercase();
            filtered.retain(|order| {
                order
                    .pickup_location
                    .as_deref()
                    .is_some_and(|v| v.to_uppercase().contains(&term))
            });
        }

        if let Some(channel_id) = query.channel_id.or(self.channel_id) {
            filtered.retain(|order| order.channel_id == Some(channel_id));
        }

        if let Some(fbs) = query.fbs {
            filtered.retain(|order| {
                order
                    .fbs
                    .as_ref()
                    .and_then(|v| v.as_i64())
                    .is_some_and(|v| v == fbs as i64)
            });
        }

        let per_page = query.per_page.map(|p| p as usize).unwrap_or(filtered.len());
        let page = query.page.unwrap_or(1).max(1) as usize;
        let start = (page - 1) * per_page;
        filtered.into_iter().skip(start).take(per_page).collect()
    }
}
