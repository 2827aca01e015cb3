// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the carrier orders API.
//!
//! The upstream API is loose about number formatting: monetary fields and
//! status codes arrive as either JSON numbers or strings depending on the
//! sales channel. Those fields are held as `serde_json::Value` and
//! normalized through accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One order as reported by the carrier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarrierOrder {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_code: Option<Value>,
    #[serde(default)]
    pub total: Option<Value>,
    #[serde(default)]
    pub tax: Option<Value>,
    #[serde(default)]
    pub channel_order_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub pickup_location: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<OrderAddress>,
    #[serde(default)]
    pub products: Vec<OrderProduct>,
    #[serde(default)]
    pub shipments: Vec<OrderShipment>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub fbs: Option<Value>,
}

impl CarrierOrder {
    /// Canonical string form of the order id.
    pub fn order_id(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Status text, empty when the carrier sent none.
    pub fn status_text(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }

    /// Numeric status code, tolerating string-encoded numbers.
    pub fn status_code(&self) -> Option<i64> {
        normalize_status_code(self.status_code.as_ref())
    }

    /// Gross order value (before tax deduction). Unparseable values are 0.
    pub fn gross_total(&self) -> f64 {
        parse_amount(self.total.as_ref())
    }

    /// Tax amount. Unparseable values are 0.
    pub fn tax_amount(&self) -> f64 {
        parse_amount(self.tax.as_ref())
    }

    /// Net amount counted toward report metrics: max(gross - tax, 0).
    pub fn net_amount(&self) -> f64 {
        (self.gross_total() - self.tax_amount()).max(0.0)
    }

    /// AWB (tracking number) of the first shipment, if any.
    pub fn awb(&self) -> Option<&str> {
        self.shipments.first().and_then(|s| s.awb.as_deref())
    }

    /// Courier name of the first shipment, if any.
    pub fn courier(&self) -> Option<&str> {
        self.shipments.first().and_then(|s| s.courier.as_deref())
    }
}

/// Shipping address as nested in an order payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl OrderAddress {
    /// Single-line rendering, skipping empty components.
    pub fn format_line(&self) -> String {
        [
            &self.name,
            &self.address1,
            &self.address2,
            &self.city,
            &self.state,
            &self.zip,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Line item in an order payload. Serialized back out when an order's
/// items are persisted alongside tracker rows.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channel_sku: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<Value>,
}

impl OrderProduct {
    pub fn unit_price(&self) -> f64 {
        parse_amount(self.price.as_ref())
    }
}

/// Shipment leg attached to an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderShipment {
    #[serde(default)]
    pub awb: Option<String>,
    #[serde(default)]
    pub courier: Option<String>,
}

/// Optional filter, sort, and pagination parameters for an order fetch.
/// The date range itself is a separate required argument.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub sort_by: Option<String>,
    pub filter_by: Option<String>,
    pub filter: Option<String>,
    pub search: Option<String>,
    pub pickup_location: Option<String>,
    pub channel_id: Option<i64>,
    pub fbs: Option<u8>,
}

/// One page of the upstream orders response.
#[derive(Debug, Deserialize)]
pub(crate) struct OrdersPage {
    #[serde(default)]
    pub data: Vec<CarrierOrder>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageMeta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Pagination {
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// Parses a loose number|string monetary value. Anything unparseable is 0.
pub fn parse_amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parses a loose number|string status code. Blank or unparseable is None.
pub fn normalize_status_code(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
