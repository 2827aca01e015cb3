// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed tracker for undelivered orders.
//!
//! Each report run re-syncs the undelivered subset from the carrier.
//! Carrier-sourced columns are fully replaced on every upsert; seller-entered
//! columns (`seller_status`, `seller_note`) stick across re-syncs and change
//! only through the explicit manual operations.

use cartpulse_core::{CartpulseError, ContactStatus, MessageId};
use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::database::storage_err;

/// Carrier-sourced fields for one undelivered order, as of the latest fetch.
///
/// Unlike cart event fields, `None` here means the carrier reported no
/// value, and the stored column is overwritten with NULL.
#[derive(Debug, Clone, Default)]
pub struct UndeliveredOrderFields {
    pub order_id: String,
    pub channel_order_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub customer_city: Option<String>,
    pub customer_state: Option<String>,
    pub customer_pincode: Option<String>,
    /// Line items serialized as JSON text.
    pub products_json: Option<String>,
    pub payment_method: Option<String>,
    pub total: Option<f64>,
    pub status_text: Option<String>,
    pub status_code: Option<i64>,
    pub awb: Option<String>,
    pub courier_name: Option<String>,
    pub order_date: Option<String>,
    pub channel_id: Option<i64>,
}

/// An undelivered-order row as stored in SQLite.
#[derive(Debug, Clone)]
pub struct UndeliveredOrderRecord {
    pub fields: UndeliveredOrderFields,
    pub seller_status: ContactStatus,
    pub seller_note: Option<String>,
    pub notification_message_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// SQLite-backed store for undelivered orders.
pub struct UndeliveredOrderStore {
    conn: Connection,
}

const ORDER_COLUMNS: &str = "order_id, channel_order_id, customer_name, customer_phone, \
     customer_email, customer_address, customer_city, customer_state, customer_pincode, \
     products, payment_method, total, status_text, status_code, awb, courier_name, \
     order_date, channel_id, seller_status, seller_note, notification_message_id, \
     created_at, updated_at";

impl UndeliveredOrderStore {
    /// Creates a new store wrapping an existing connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Inserts or refreshes an order from carrier data.
    ///
    /// Carrier columns are replaced wholesale, including to NULL.
    /// `seller_status` defaults to Not Contacted only on first insert;
    /// `seller_note` and `notification_message_id` are never touched here.
    pub async fn upsert(&self, fields: &UndeliveredOrderFields) -> Result<(), CartpulseError> {
        let f = fields.clone();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO undelivered_orders (order_id, channel_order_id, \
                     customer_name, customer_phone, customer_email, customer_address, \
                     customer_city, customer_state, customer_pincode, products, \
                     payment_method, total, status_text, status_code, awb, courier_name, \
                     order_date, channel_id, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, \
                     ?15, ?16, ?17, ?18, ?19, ?19) \
                     ON CONFLICT(order_id) DO UPDATE SET \
                     channel_order_id = excluded.channel_order_id, \
                     customer_name = excluded.customer_name, \
                     customer_phone = excluded.customer_phone, \
                     customer_email = excluded.customer_email, \
                     customer_address = excluded.customer_address, \
                     customer_city = excluded.customer_city, \
                     customer_state = excluded.customer_state, \
                     customer_pincode = excluded.customer_pincode, \
                     products = excluded.products, \
                     payment_method = excluded.payment_method, \
                     total = excluded.total, \
                     status_text = excluded.status_text, \
                     status_code = excluded.status_code, \
                     awb = excluded.awb, \
                     courier_name = excluded.courier_name, \
                     order_date = excluded.order_date, \
                     channel_id = excluded.channel_id, \
                     updated_at = excluded.updated_at",
                    rusqlite::params![
                        f.order_id,
                        f.channel_order_id,
                        f.customer_name,
                        f.customer_phone,
                        f.customer_email,
                        f.customer_address,
                        f.customer_city,
                        f.customer_state,
                        f.customer_pincode,
                        f.products_json,
                        f.payment_method,
                        f.total,
                        f.status_text,
                        f.status_code,
                        f.awb,
                        f.courier_name,
                        f.order_date,
                        f.channel_id,
                        now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Retrieves an order by id.
    pub async fn get(
        &self,
        order_id: &str,
    ) -> Result<Option<UndeliveredOrderRecord>, CartpulseError> {
        let order_id = order_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ORDER_COLUMNS} FROM undelivered_orders WHERE order_id = ?1"
                ))?;
                let record = stmt
                    .query_row(rusqlite::params![order_id], row_to_record)
                    .optional()?;
                Ok(record)
            })
            .await
            .map_err(storage_err)
    }

    /// Advances the seller contact status one step around the fixed ring:
    /// Not Contacted -> Called and Converted -> Called but Not Converted ->
    /// Not Contacted. Returns the new status, or None if the order is
    /// unknown.
    pub async fn advance_status(
        &self,
        order_id: &str,
    ) -> Result<Option<ContactStatus>, CartpulseError> {
        let order_id = order_id.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                let current: Option<String> = conn
                    .query_row(
                        "SELECT seller_status FROM undelivered_orders WHERE order_id = ?1",
                        rusqlite::params![order_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(current) = current else {
                    return Ok(None);
                };
                let next = ContactStatus::from_str_value(&current).advance();
                conn.execute(
                    "UPDATE undelivered_orders SET seller_status = ?2, updated_at = ?3 \
                     WHERE order_id = ?1",
                    rusqlite::params![order_id, next.as_str(), now],
                )?;
                Ok(Some(next))
            })
            .await
            .map_err(storage_err)
    }

    /// Sets the seller note. This is the only operation that changes it.
    pub async fn set_note(&self, order_id: &str, note: &str) -> Result<(), CartpulseError> {
        let order_id = order_id.to_string();
        let note = note.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE undelivered_orders SET seller_note = ?2, updated_at = ?3 \
                     WHERE order_id = ?1",
                    rusqlite::params![order_id, note, now],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Records the chat message id of the notification sent for this order.
    pub async fn set_message_id(
        &self,
        order_id: &str,
        message_id: &MessageId,
    ) -> Result<(), CartpulseError> {
        let order_id = order_id.to_string();
        let message_id = message_id.0.clone();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE undelivered_orders SET notification_message_id = ?2, \
                     updated_at = ?3 WHERE order_id = ?1",
                    rusqlite::params![order_id, message_id, now],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<UndeliveredOrderRecord, rusqlite::Error> {
    let seller_status: String = row.get(18)?;
    Ok(UndeliveredOrderRecord {
        fields: UndeliveredOrderFields {
            order_id: row.get(0)?,
            channel_order_id: row.get(1)?,
            customer_name: row.get(2)?,
            customer_phone: row.get(3)?,
            customer_email: row.get(4)?,
            customer_address: row.get(5)?,
            customer_city: row.get(6)?,
            customer_state: row.get(7)?,
            customer_pincode: row.get(8)?,
            products_json: row.get(9)?,
            payment_method: row.get(10)?,
            total: row.get(11)?,
            status_text: row.get(12)?,
            status_code: row.get(13)?,
            awb: row.get(14)?,
            courier_name: row.get(15)?,
            order_date: row.get(16)?,
            channel_id: row.get(17)?,
        },
        seller_status: ContactStatus::from_str_value(&seller_status),
        seller_note: row.get(19)?,
        notification_message_id: row.get(20)?,
        created_at: row.get(21)?,
        updated_at: row.get(22)?,
    })
}
