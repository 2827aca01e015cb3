// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound cart event payload and richness classification.
//!
//! Storefronts send two shapes of event for the same cart: a minimal one
//! carrying little more than a phone number, and a rich one carrying a
//! shipping address and/or item detail. The payload is a typed struct
//! validated at the boundary; unknown extra keys are ignored.

use cartpulse_core::{CartpulseError, Richness};
use cartpulse_storage::CartEventFields;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One inbound cart webhook payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartEventPayload {
    #[serde(default)]
    pub cart_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<Map<String, Value>>,
    /// Structured line items.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Name-only item listing, with prices in a parallel array.
    #[serde(default)]
    pub item_name_list: Vec<String>,
    #[serde(default)]
    pub item_price_list: Vec<String>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Structured line item of a cart event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CartItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
}

impl CartEventPayload {
    /// Returns the cart id, rejecting payloads that carry none.
    pub fn cart_id(&self) -> Result<&str, CartpulseError> {
        match self.cart_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(CartpulseError::InvalidPayload(
                "missing cart_id".to_string(),
            )),
        }
    }

    fn has_address(&self) -> bool {
        self.shipping_address
            .as_ref()
            .is_some_and(|address| !address.is_empty())
    }

    fn has_items(&self) -> bool {
        !self.items.is_empty() || !self.item_name_list.is_empty()
    }

    /// Abandoned when the event carries a non-empty shipping address or
    /// any item detail, PhoneReceived otherwise.
    pub fn richness(&self) -> Richness {
        if self.has_address() || self.has_items() {
            Richness::Abandoned
        } else {
            Richness::PhoneReceived
        }
    }

    /// Product image URLs carried by the structured items, trimmed and
    /// with blanks dropped.
    pub fn image_urls(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.img_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn customer_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() { None } else { Some(name) }
    }

    /// Converts the payload into the event-sourced columns of a cart
    /// record. Fields the event did not carry stay `None` so the store's
    /// COALESCE upsert leaves earlier values intact.
    pub fn to_fields(&self) -> Result<CartEventFields, CartpulseError> {
        let cart_id = self.cart_id()?.to_string();
        let shipping_address_json = match &self.shipping_address {
            Some(address) => Some(serde_json::to_string(address).map_err(|e| {
                CartpulseError::InvalidPayload(format!("unserializable shipping_address: {e}"))
            })?),
            None => None,
        };
        let items_json = if self.items.is_empty() {
            synthesize_items(&self.item_name_list, &self.item_price_list)
        } else {
            serde_json::to_string(&self.items).ok()
        };
        let image_urls = self.image_urls();
        let image_urls_json = if image_urls.is_empty() {
            None
        } else {
            serde_json::to_string(&image_urls).ok()
        };

        Ok(CartEventFields {
            cart_id,
            phone: self.phone_number.clone(),
            customer_name: self.customer_name(),
            email: self.email.clone(),
            shipping_address_json,
            items_json,
            total_price: self.total_price,
            currency: self.currency.clone(),
            checkout_url: self.checkout_url.clone(),
            image_urls_json,
            event_updated_at: self.updated_at.clone(),
        })
    }
}

/// Builds structured items from the name/price parallel arrays.
fn synthesize_items(names: &[String], prices: &[String]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let items: Vec<CartItem> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| CartItem {
            name: Some(name.clone()),
            price: prices
                .get(idx)
                .and_then(|p| p.trim().parse::<f64>().ok())
                .and_then(|p| serde_json::Number::from_f64(p).map(Value::Number)),
            quantity: Some(1),
            ..Default::default()
        })
        .collect();
    serde_json::to_string(&items).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> CartEventPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_cart_id_is_invalid() {
        let event = payload(json!({"phone_number": "9876543210"}));
        assert!(matches!(
            event.cart_id(),
            Err(CartpulseError::InvalidPayload(_))
        ));

        let blank = payload(json!({"cart_id": "  "}));
        assert!(blank.cart_id().is_err());
    }

    #[test]
    fn bare_payload_is_phone_received() {
        let event = payload(json!({"cart_id": "c1", "phone_number": "9876543210"}));
        assert_eq!(event.richness(), Richness::PhoneReceived);
    }

    #[test]
    fn address_or_items_make_it_abandoned() {
        let with_address = payload(json!({
            "cart_id": "c1",
            "shipping_address": {"city": "Pune"}
        }));
        assert_eq!(with_address.richness(), Richness::Abandoned);

        let with_items = payload(json!({
            "cart_id": "c1",
            "items": [{"name": "X", "price": 100, "quantity": 1}]
        }));
        assert_eq!(with_items.richness(), Richness::Abandoned);

        let with_name_list = payload(json!({
            "cart_id": "c1",
            "item_name_list": ["X"],
            "item_price_list": ["100"]
        }));
        assert_eq!(with_name_list.richness(), Richness::Abandoned);
    }

    #[test]
    fn empty_address_and_items_stay_phone_received() {
        let event = payload(json!({
            "cart_id": "c1",
            "shipping_address": {},
            "items": []
        }));
        assert_eq!(event.richness(), Richness::PhoneReceived);
    }

    #[test]
    fn image_urls_are_trimmed_and_filtered() {
        let event = payload(json!({
            "cart_id": "c1",
            "items": [
                {"name": "A", "img_url": " https://cdn.example.com/a.jpg "},
                {"name": "B", "img_url": "   "},
                {"name": "C"}
            ]
        }));
        assert_eq!(event.image_urls(), vec!["https://cdn.example.com/a.jpg"]);
    }

    #[test]
    fn fields_conversion_joins_name_and_serializes_json() {
        let event = payload(json!({
            "cart_id": "c1",
            "first_name": "Asha",
            "last_name": "Rao",
            "shipping_address": {"city": "Pune"},
            "items": [{"name": "X", "price": 100, "quantity": 1, "img_url": "https://x/img.jpg"}],
            "total_price": 100.0
        }));

        let fields = event.to_fields().unwrap();
        assert_eq!(fields.cart_id, "c1");
        assert_eq!(fields.customer_name.as_deref(), Some("Asha Rao"));
        assert!(fields.shipping_address_json.as_deref().unwrap().contains("Pune"));
        assert!(fields.items_json.as_deref().unwrap().contains("\"X\""));
        assert!(fields.image_urls_json.as_deref().unwrap().contains("img.jpg"));
        assert_eq!(fields.total_price, Some(100.0));
    }

    #[test]
    fn name_list_synthesizes_items() {
        let event = payload(json!({
            "cart_id": "c1",
            "item_name_list": ["Mug", "Plate"],
            "item_price_list": ["450"]
        }));
        let fields = event.to_fields().unwrap();
        let items: Vec<CartItem> =
            serde_json::from_str(fields.items_json.as_deref().unwrap()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name.as_deref(), Some("Mug"));
        assert_eq!(items[0].price, Some(json!(450.0)));
        assert_eq!(items[1].name.as_deref(), Some("Plate"));
        assert!(items[1].price.is_none());
    }

    #[test]
    fn absent_fields_stay_none_for_coalescing_upserts() {
        let event = payload(json!({"cart_id": "c1"}));
        let fields = event.to_fields().unwrap();
        assert!(fields.phone.is_none());
        assert!(fields.shipping_address_json.is_none());
        assert!(fields.items_json.is_none());
        assert!(fields.image_urls_json.is_none());
    }
}
