// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One report run, end to end: fetch orders over the period's date range,
//! aggregate metrics, send the report, then re-sync and notify the
//! undelivered subset.
//!
//! Undelivered notifications are best-effort per order. A failure on one
//! order is logged and never aborts the rest of the batch or the run.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use cartpulse_carrier::{CarrierClient, CarrierOrder, OrderQuery};
use cartpulse_config::ReportingConfig;
use cartpulse_core::{CartpulseError, MessageSink, OutboundMessage, ReportPeriod, StatusBucket};
use cartpulse_storage::{UndeliveredOrderFields, UndeliveredOrderStore};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::classifier::classify;
use crate::format::{format_report, format_undelivered_message};
use crate::metrics::aggregate;
use crate::scheduler::PeriodJob;

/// Executes report runs against the carrier, the message sink, and the
/// undelivered-order tracker.
pub struct ReportRunner {
    carrier: Arc<CarrierClient>,
    sink: Arc<dyn MessageSink>,
    undelivered: Arc<UndeliveredOrderStore>,
    timezone: Tz,
    // Lookback days indexed by ReportPeriod::index().
    lookback_days: [u32; 3],
}

impl ReportRunner {
    pub fn new(
        carrier: Arc<CarrierClient>,
        sink: Arc<dyn MessageSink>,
        undelivered: Arc<UndeliveredOrderStore>,
        reporting: &ReportingConfig,
    ) -> Result<Self, CartpulseError> {
        let timezone = Tz::from_str(&reporting.timezone).map_err(|_| {
            CartpulseError::Config(format!("invalid reporting timezone: {}", reporting.timezone))
        })?;
        Ok(Self {
            carrier,
            sink,
            undelivered,
            timezone,
            lookback_days: [
                reporting.daily_lookback_days.max(1),
                reporting.weekly_lookback_days.max(1),
                reporting.monthly_lookback_days.max(1),
            ],
        })
    }

    /// Resolves the inclusive date range of a period: the range ends on
    /// today's local date and spans the configured number of days.
    pub fn resolve_range(&self, period: ReportPeriod, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        let end = now.with_timezone(&self.timezone).date_naive();
        let lookback = self.lookback_days[period.index()];
        let start = end - Duration::days(i64::from(lookback) - 1);
        (start, end)
    }

    /// Runs one report: fetch, aggregate, send, then notify undelivered
    /// orders.
    pub async fn run_report(&self, period: ReportPeriod) -> Result<(), CartpulseError> {
        let (start, end) = self.resolve_range(period, Utc::now());
        info!(%period, %start, %end, "running report");

        let orders = self
            .carrier
            .fetch_orders(start, end, &OrderQuery::default())
            .await?;
        let metrics = aggregate(&orders);
        info!(
            %period,
            orders = metrics.total_orders,
            undelivered = metrics.undelivered.count,
            "aggregated report metrics"
        );

        let report = format_report(period, start, end, &metrics);
        self.sink.send(&OutboundMessage::html(report)).await?;

        self.notify_undelivered(&orders).await;
        Ok(())
    }

    /// Re-syncs every undelivered order into the tracker and sends its
    /// notification. Per-order failures are logged and skipped.
    async fn notify_undelivered(&self, orders: &[CarrierOrder]) {
        for order in orders {
            if classify(order.status_text(), order.status_code()) != StatusBucket::Undelivered {
                continue;
            }
            let order_id = order.order_id();
            if order_id.is_empty() {
                warn!("skipping undelivered order without an id");
                continue;
            }
            if let Err(error) = self.notify_one(order, &order_id).await {
                warn!(%order_id, %error, "undelivered notification failed");
            }
        }
    }

    async fn notify_one(&self, order: &CarrierOrder, order_id: &str) -> Result<(), CartpulseError> {
        self.undelivered.upsert(&order_to_fields(order)).await?;
        let record = self.undelivered.get(order_id).await?.ok_or_else(|| {
            CartpulseError::Internal(format!("order {order_id} missing after upsert"))
        })?;
        let message_id = self
            .sink
            .send(&format_undelivered_message(&record))
            .await?;
        self.undelivered.set_message_id(order_id, &message_id).await
    }
}

#[async_trait]
impl PeriodJob for ReportRunner {
    async fn run(&self, period: ReportPeriod) -> Result<(), CartpulseError> {
        self.run_report(period).await
    }
}

fn order_to_fields(order: &CarrierOrder) -> UndeliveredOrderFields {
    let address = order.shipping_address.as_ref();
    let street = address.and_then(|a| {
        let parts: Vec<&str> = [a.address1.as_deref(), a.address2.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    });
    let products_json = if order.products.is_empty() {
        None
    } else {
        serde_json::to_string(&order.products).ok()
    };

    UndeliveredOrderFields {
        order_id: order.order_id(),
        channel_order_id: order.channel_order_id.clone(),
        customer_name: order.customer_name.clone(),
        customer_phone: order.customer_phone.clone(),
        customer_email: order.customer_email.clone(),
        customer_address: street,
        customer_city: address.and_then(|a| a.city.clone()),
        customer_state: address.and_then(|a| a.state.clone()),
        customer_pincode: address.and_then(|a| a.zip.clone()),
        products_json,
        payment_method: order.payment_method.clone(),
        total: Some(order.net_amount()),
        status_text: order.status.clone(),
        status_code: order.status_code(),
        awb: order.awb().map(str::to_string),
        courier_name: order.courier().map(str::to_string),
        order_date: order.created_at.clone(),
        channel_id: order.channel_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartpulse_core::MessageId;
    use cartpulse_storage::Database;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingSink {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn messages(&self) -> Vec<OutboundMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send(&self, message: &OutboundMessage) -> Result<MessageId, CartpulseError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(message.clone());
            Ok(MessageId(sent.len().to_string()))
        }

        async fn edit(
            &self,
            _message_id: &MessageId,
            _message: &OutboundMessage,
        ) -> Result<(), CartpulseError> {
            Ok(())
        }

        async fn send_media_group(
            &self,
            _photo_urls: &[String],
            _caption: Option<&str>,
        ) -> Result<(), CartpulseError> {
            Ok(())
        }
    }

    fn carrier_order(value: serde_json::Value) -> CarrierOrder {
        serde_json::from_value(value).unwrap()
    }

    async fn runner_with(
        orders: Vec<CarrierOrder>,
    ) -> (ReportRunner, Arc<RecordingSink>, Arc<UndeliveredOrderStore>) {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(UndeliveredOrderStore::new(db.connection()));
        let sink = Arc::new(RecordingSink::new());
        let runner = ReportRunner::new(
            Arc::new(CarrierClient::fixture(orders)),
            sink.clone(),
            store.clone(),
            &ReportingConfig::default(),
        )
        .unwrap();
        (runner, sink, store)
    }

    #[tokio::test]
    async fn range_ends_on_local_today() {
        let (runner, _sink, _store) = runner_with(Vec::new()).await;

        // 2026-08-22 21:00 UTC is already 2026-08-23 in Asia/Kolkata.
        let now = Utc.with_ymd_and_hms(2026, 8, 22, 21, 0, 0).unwrap();
        let (start, end) = runner.resolve_range(ReportPeriod::Daily, now);
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 23).unwrap());
        assert_eq!(start, end);

        let (start, end) = runner.resolve_range(ReportPeriod::Weekly, now);
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 23).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 17).unwrap());

        let (start, _) = runner.resolve_range(ReportPeriod::Monthly, now);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 7, 25).unwrap());
    }

    #[tokio::test]
    async fn bad_timezone_is_a_config_error() {
        let db = Database::open_in_memory().await.unwrap();
        let result = ReportRunner::new(
            Arc::new(CarrierClient::fixture(Vec::new())),
            Arc::new(RecordingSink::new()),
            Arc::new(UndeliveredOrderStore::new(db.connection())),
            &ReportingConfig {
                timezone: "Mars/Olympus".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(CartpulseError::Config(_))));
    }

    #[tokio::test]
    async fn run_sends_report_then_undelivered_notifications() {
        let (runner, sink, store) = runner_with(vec![
            carrier_order(json!({
                "id": 1, "status": "DELIVERED", "total": "100"
            })),
            carrier_order(json!({
                "id": 2,
                "status": "UNDELIVERED",
                "status_code": 36,
                "total": "550",
                "tax": "50",
                "channel_order_id": "SHOP-2",
                "customer_name": "Ravi",
                "customer_phone": "9876543210",
                "shipping_address": {"address1": "12 MG Road", "city": "Pune", "zip": "411001"},
                "products": [{"name": "Mug", "quantity": 1, "price": "500"}],
                "shipments": [{"awb": "AWB2", "courier": "Bluedart"}]
            })),
        ])
        .await;

        runner.run_report(ReportPeriod::Daily).await.unwrap();

        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].text.contains("Daily Order Report"));
        assert!(messages[0].text.contains("Orders: <b>2</b>"));
        assert!(messages[1].text.contains("Order: SHOP-2"));
        assert!(messages[1].keyboard.is_some());

        let record = store.get("2").await.unwrap().unwrap();
        assert_eq!(record.fields.customer_city.as_deref(), Some("Pune"));
        assert_eq!(record.fields.awb.as_deref(), Some("AWB2"));
        assert_eq!(record.fields.total, Some(500.0));
        // The sink handed back "2" for the second message it sent.
        assert_eq!(record.notification_message_id.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn delivered_only_batch_sends_just_the_report() {
        let (runner, sink, _store) = runner_with(vec![carrier_order(json!({
            "id": 1, "status": "DELIVERED", "total": "100"
        }))])
        .await;

        runner.run_report(ReportPeriod::Weekly).await.unwrap();
        assert_eq!(sink.messages().len(), 1);
    }

    #[tokio::test]
    async fn resync_preserves_seller_annotations() {
        let order = carrier_order(json!({
            "id": 9, "status": "UNDELIVERED", "status_code": 36, "total": "100"
        }));
        let (runner, _sink, store) = runner_with(vec![order]).await;

        runner.run_report(ReportPeriod::Daily).await.unwrap();
        store.advance_status("9").await.unwrap();
        store.set_note("9", "call back tomorrow").await.unwrap();

        runner.run_report(ReportPeriod::Daily).await.unwrap();
        let record = store.get("9").await.unwrap().unwrap();
        assert_eq!(
            record.seller_status,
            cartpulse_core::ContactStatus::CalledAndConverted
        );
        assert_eq!(record.seller_note.as_deref(), Some("call back tomorrow"));
    }
}
