// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed persistence for cart records.
//!
//! [`CartStore`] manages the `carts` table. Event upserts only overwrite
//! the event-sourced columns a new event actually carries; seller-entered
//! columns (`status`, `note`) and the notification message id are never
//! touched by an event upsert.

use cartpulse_core::{CartpulseError, ContactStatus, MessageId, Richness};
use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::database::storage_err;

/// Event-sourced cart fields as extracted from one inbound webhook.
///
/// `None` means the event did not carry the field, so the stored value
/// (if any) is left intact on upsert. JSON-shaped fields are stored as
/// serialized JSON text.
#[derive(Debug, Clone, Default)]
pub struct CartEventFields {
    pub cart_id: String,
    pub phone: Option<String>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub shipping_address_json: Option<String>,
    pub items_json: Option<String>,
    pub total_price: Option<f64>,
    pub currency: Option<String>,
    pub checkout_url: Option<String>,
    pub image_urls_json: Option<String>,
    pub event_updated_at: Option<String>,
}

/// A cart row as stored in SQLite.
#[derive(Debug, Clone)]
pub struct CartRecord {
    pub cart_id: String,
    pub phone: Option<String>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub shipping_address_json: Option<String>,
    pub items_json: Option<String>,
    pub total_price: Option<f64>,
    pub currency: Option<String>,
    pub checkout_url: Option<String>,
    pub image_urls_json: Option<String>,
    pub event_updated_at: Option<String>,
    pub status: ContactStatus,
    pub note: Option<String>,
    pub notification_message_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CartRecord {
    /// Richness of the stored cart content.
    ///
    /// Abandoned when the record carries a non-empty shipping address
    /// object or a non-empty item list, PhoneReceived otherwise. Because
    /// upserts never blank a previously stored field, richness never
    /// regresses once a cart has gone Abandoned.
    pub fn richness(&self) -> Richness {
        let has_address = self
            .shipping_address_json
            .as_deref()
            .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
            .and_then(|v| v.as_object().map(|o| !o.is_empty()))
            .unwrap_or(false);
        let has_items = self
            .items_json
            .as_deref()
            .and_then(|s| serde_json::from_str::<serde_json::Value>(s).ok())
            .and_then(|v| v.as_array().map(|a| !a.is_empty()))
            .unwrap_or(false);
        if has_address || has_items {
            Richness::Abandoned
        } else {
            Richness::PhoneReceived
        }
    }

    /// Stored product image URLs, if any.
    pub fn image_urls(&self) -> Vec<String> {
        self.image_urls_json
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .unwrap_or_default()
    }
}

/// SQLite-backed store for cart records.
pub struct CartStore {
    conn: Connection,
}

const CART_COLUMNS: &str = "cart_id, phone, customer_name, email, shipping_address, items, \
     total_price, currency, checkout_url, image_urls, event_updated_at, \
     status, note, notification_message_id, created_at, updated_at";

impl CartStore {
    /// Creates a new CartStore wrapping an existing connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Inserts or updates a cart from an inbound event.
    ///
    /// On conflict, each event-sourced column takes the incoming value
    /// only when the event carried it (COALESCE against the stored row),
    /// so a later, poorer event cannot blank out richer predecessor data.
    /// `status`, `note` and `notification_message_id` are untouched.
    pub async fn upsert_from_event(&self, fields: &CartEventFields) -> Result<(), CartpulseError> {
        let f = fields.clone();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO carts (cart_id, phone, customer_name, email, \
                     shipping_address, items, total_price, currency, checkout_url, \
                     image_urls, event_updated_at, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12) \
                     ON CONFLICT(cart_id) DO UPDATE SET \
                     phone = COALESCE(excluded.phone, carts.phone), \
                     customer_name = COALESCE(excluded.customer_name, carts.customer_name), \
                     email = COALESCE(excluded.email, carts.email), \
                     shipping_address = COALESCE(excluded.shipping_address, carts.shipping_address), \
                     items = COALESCE(excluded.items, carts.items), \
                     total_price = COALESCE(excluded.total_price, carts.total_price), \
                     currency = COALESCE(excluded.currency, carts.currency), \
                     checkout_url = COALESCE(excluded.checkout_url, carts.checkout_url), \
                     image_urls = COALESCE(excluded.image_urls, carts.image_urls), \
                     event_updated_at = COALESCE(excluded.event_updated_at, carts.event_updated_at), \
                     updated_at = excluded.updated_at",
                    rusqlite::params![
                        f.cart_id,
                        f.phone,
                        f.customer_name,
                        f.email,
                        f.shipping_address_json,
                        f.items_json,
                        f.total_price,
                        f.currency,
                        f.checkout_url,
                        f.image_urls_json,
                        f.event_updated_at,
                        now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Retrieves a cart by id.
    pub async fn get(&self, cart_id: &str) -> Result<Option<CartRecord>, CartpulseError> {
        let cart_id = cart_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CART_COLUMNS} FROM carts WHERE cart_id = ?1"
                ))?;
                let record = stmt
                    .query_row(rusqlite::params![cart_id], row_to_record)
                    .optional()?;
                Ok(record)
            })
            .await
            .map_err(storage_err)
    }

    /// Records the chat message id of the live notification for a cart.
    pub async fn set_message_id(
        &self,
        cart_id: &str,
        message_id: &MessageId,
    ) -> Result<(), CartpulseError> {
        let cart_id = cart_id.to_string();
        let message_id = message_id.0.clone();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE carts SET notification_message_id = ?2, updated_at = ?3 \
                     WHERE cart_id = ?1",
                    rusqlite::params![cart_id, message_id, now],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Sets the seller contact status (manual action).
    pub async fn update_status(
        &self,
        cart_id: &str,
        status: ContactStatus,
    ) -> Result<(), CartpulseError> {
        let cart_id = cart_id.to_string();
        let status = status.as_str().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE carts SET status = ?2, updated_at = ?3 WHERE cart_id = ?1",
                    rusqlite::params![cart_id, status, now],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Sets the seller note (manual action).
    pub async fn set_note(&self, cart_id: &str, note: &str) -> Result<(), CartpulseError> {
        let cart_id = cart_id.to_string();
        let note = note.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE carts SET note = ?2, updated_at = ?3 WHERE cart_id = ?1",
                    rusqlite::params![cart_id, note, now],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<CartRecord, rusqlite::Error> {
    let status: String = row.get(11)?;
    Ok(CartRecord {
        cart_id: row.get(0)?,
        phone: row.get(1)?,
        customer_name: row.get(2)?,
        email: row.get(3)?,
        shipping_address_json: row.get(4)?,
        items_json: row.get(5)?,
        total_price: row.get(6)?,
        currency: row.get(7)?,
        checkout_url: row.get(8)?,
        image_urls_json: row.get(9)?,
        event_updated_at: row.get(10)?,
        status: ContactStatus::from_str_value(&status),
        note: row.get(12)?,
        notification_message_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    async fn setup() -> CartStore {
        let db = Database::open_in_memory().await.unwrap();
        CartStore::new(db.connection())
    }

    fn minimal_event(cart_id: &str) -> CartEventFields {
        CartEventFields {
            cart_id: cart_id.to_string(),
            phone: Some("9876543210".to_string()),
            ..Default::default()
        }
    }

    fn rich_event(cart_id: &str) -> CartEventFields {
        CartEventFields {
            cart_id: cart_id.to_string(),
            customer_name: Some("Asha".to_string()),
            shipping_address_json: Some(r#"{"city":"Pune"}"#.to_string()),
            items_json: Some(r#"[{"name":"X","price":100,"quantity":1}]"#.to_string()),
            total_price: Some(100.0),
            image_urls_json: Some(r#"["https://cdn.example.com/x.jpg"]"#.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_and_get_roundtrip() {
        let store = setup().await;
        store.upsert_from_event(&rich_event("c1")).await.unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(record.cart_id, "c1");
        assert_eq!(record.customer_name.as_deref(), Some("Asha"));
        assert_eq!(record.total_price, Some(100.0));
        assert_eq!(record.status, ContactStatus::NotContacted);
        assert!(record.notification_message_id.is_none());
        assert_eq!(record.richness(), Richness::Abandoned);
        assert_eq!(record.image_urls(), vec!["https://cdn.example.com/x.jpg"]);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let store = setup().await;
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn minimal_record_is_phone_received() {
        let store = setup().await;
        store.upsert_from_event(&minimal_event("c1")).await.unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(record.richness(), Richness::PhoneReceived);
        assert!(record.image_urls().is_empty());
    }

    #[tokio::test]
    async fn poorer_event_does_not_blank_richer_fields() {
        let store = setup().await;
        store.upsert_from_event(&rich_event("c1")).await.unwrap();
        store.upsert_from_event(&minimal_event("c1")).await.unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        // Phone from the second event landed, richer fields survived.
        assert_eq!(record.phone.as_deref(), Some("9876543210"));
        assert_eq!(record.customer_name.as_deref(), Some("Asha"));
        assert!(record.shipping_address_json.is_some());
        assert_eq!(record.richness(), Richness::Abandoned);
    }

    #[tokio::test]
    async fn upsert_preserves_status_note_and_message_id() {
        let store = setup().await;
        store.upsert_from_event(&minimal_event("c1")).await.unwrap();
        store
            .set_message_id("c1", &MessageId("42".to_string()))
            .await
            .unwrap();
        store
            .update_status("c1", ContactStatus::CalledAndConverted)
            .await
            .unwrap();
        store.set_note("c1", "asked to call back").await.unwrap();

        store.upsert_from_event(&rich_event("c1")).await.unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(record.notification_message_id.as_deref(), Some("42"));
        assert_eq!(record.status, ContactStatus::CalledAndConverted);
        assert_eq!(record.note.as_deref(), Some("asked to call back"));
    }

    #[tokio::test]
    async fn empty_address_object_is_not_rich() {
        let store = setup().await;
        let mut event = minimal_event("c1");
        event.shipping_address_json = Some("{}".to_string());
        event.items_json = Some("[]".to_string());
        store.upsert_from_event(&event).await.unwrap();

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(record.richness(), Richness::PhoneReceived);
    }
}
