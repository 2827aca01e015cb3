// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification reconciliation for inbound cart events.
//!
//! For each event the reconciler decides between sending a new chat
//! message, editing the existing one in place, or suppressing output.
//! The decision compares the stored record's richness against the
//! incoming event's richness; a later, poorer event must never regress a
//! richer notification. Processing is serialized per cart id so two
//! near-simultaneous events for the same cart cannot both decide
//! "send new".

use std::sync::Arc;

use cartpulse_core::{CartpulseError, MessageId, MessageSink, Richness};
use cartpulse_storage::{CartEventFields, CartRecord, CartStore};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::event::CartEventPayload;
use crate::format::{format_cart_message, NEW_IMAGES_CAPTION, UPGRADE_IMAGES_CAPTION};

/// Outcome of the pure reconciliation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileDecision {
    SendNew,
    UpdateExisting { message_id: MessageId, upgrade: bool },
    Suppress,
}

/// Action taken for a processed event, reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    SentNewMessage,
    UpdatedMessage,
    NoMessage,
}

impl ReconcileAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileAction::SentNewMessage => "sent_new_message",
            ReconcileAction::UpdatedMessage => "updated_message",
            ReconcileAction::NoMessage => "no_message",
        }
    }
}

/// Pure decision over the stored state and the incoming richness.
///
/// A record without a live message id is treated as if no message
/// existed, so a fresh one is sent.
pub fn decide(existing: Option<&CartRecord>, incoming: Richness) -> ReconcileDecision {
    let Some(record) = existing else {
        return ReconcileDecision::SendNew;
    };
    let Some(message_id) = record.notification_message_id.clone() else {
        return ReconcileDecision::SendNew;
    };
    let message_id = MessageId(message_id);

    match (incoming, record.richness()) {
        (Richness::Abandoned, Richness::PhoneReceived) => ReconcileDecision::UpdateExisting {
            message_id,
            upgrade: true,
        },
        (Richness::PhoneReceived, Richness::Abandoned) => ReconcileDecision::Suppress,
        _ => ReconcileDecision::UpdateExisting {
            message_id,
            upgrade: false,
        },
    }
}

/// Orchestrates persistence and outbound messaging for cart events.
pub struct NotificationReconciler {
    store: Arc<CartStore>,
    sink: Arc<dyn MessageSink>,
    cart_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl NotificationReconciler {
    pub fn new(store: Arc<CartStore>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            store,
            sink,
            cart_locks: DashMap::new(),
        }
    }

    /// Processes one inbound event end to end.
    ///
    /// Ordering on send-new: persist the record, send the image batch (if
    /// the event carries any), send the message, then persist the returned
    /// message id. On an upgrade edit the image batch goes out before the
    /// text edit. Persistence and sink failures both propagate and abort
    /// processing.
    pub async fn process(
        &self,
        payload: &CartEventPayload,
    ) -> Result<ReconcileAction, CartpulseError> {
        let fields = payload.to_fields()?;
        let cart_id = fields.cart_id.clone();

        let lock = self
            .cart_locks
            .entry(cart_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;
        let result = self.reconcile(payload, &fields, &cart_id).await;
        drop(guard);
        drop(lock);
        // Prune the lock entry unless another event for this cart still
        // holds a clone (strong count > 1 means one is in flight).
        self.cart_locks
            .remove_if(&cart_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn reconcile(
        &self,
        payload: &CartEventPayload,
        fields: &CartEventFields,
        cart_id: &str,
    ) -> Result<ReconcileAction, CartpulseError> {
        let existing = self.store.get(cart_id).await?;
        let decision = decide(existing.as_ref(), payload.richness());
        self.store.upsert_from_event(fields).await?;

        match decision {
            ReconcileDecision::SendNew => {
                let images = payload.image_urls();
                if !images.is_empty() {
                    self.sink
                        .send_media_group(&images, Some(NEW_IMAGES_CAPTION))
                        .await?;
                }
                let record = self.fresh_record(cart_id).await?;
                let message_id = self.sink.send(&format_cart_message(&record)).await?;
                self.store.set_message_id(cart_id, &message_id).await?;
                info!(%cart_id, "sent new cart notification");
                Ok(ReconcileAction::SentNewMessage)
            }
            ReconcileDecision::UpdateExisting {
                message_id,
                upgrade,
            } => {
                if upgrade {
                    let images = payload.image_urls();
                    if !images.is_empty() {
                        self.sink
                            .send_media_group(&images, Some(UPGRADE_IMAGES_CAPTION))
                            .await?;
                    }
                }
                let record = self.fresh_record(cart_id).await?;
                self.sink
                    .edit(&message_id, &format_cart_message(&record))
                    .await?;
                info!(%cart_id, upgrade, "updated cart notification");
                Ok(ReconcileAction::UpdatedMessage)
            }
            ReconcileDecision::Suppress => {
                debug!(%cart_id, "poorer event suppressed, record refreshed");
                Ok(ReconcileAction::NoMessage)
            }
        }
    }

    async fn fresh_record(&self, cart_id: &str) -> Result<CartRecord, CartpulseError> {
        self.store.get(cart_id).await?.ok_or_else(|| {
            CartpulseError::Internal(format!("cart {cart_id} missing after upsert"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cartpulse_core::OutboundMessage;
    use cartpulse_storage::Database;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq)]
    enum SinkEvent {
        Media(Vec<String>, Option<String>),
        Sent(String),
        Edited(String, String),
    }

    struct RecordingSink {
        events: StdMutex<Vec<SinkEvent>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: StdMutex::new(Vec::new()),
            }
        }

        fn events(&self) -> Vec<SinkEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send(&self, message: &OutboundMessage) -> Result<MessageId, CartpulseError> {
            let mut events = self.events.lock().unwrap();
            events.push(SinkEvent::Sent(message.text.clone()));
            Ok(MessageId(format!("m{}", events.len())))
        }

        async fn edit(
            &self,
            message_id: &MessageId,
            message: &OutboundMessage,
        ) -> Result<(), CartpulseError> {
            self.events
                .lock()
                .unwrap()
                .push(SinkEvent::Edited(message_id.0.clone(), message.text.clone()));
            Ok(())
        }

        async fn send_media_group(
            &self,
            photo_urls: &[String],
            caption: Option<&str>,
        ) -> Result<(), CartpulseError> {
            self.events.lock().unwrap().push(SinkEvent::Media(
                photo_urls.to_vec(),
                caption.map(str::to_string),
            ));
            Ok(())
        }
    }

    async fn setup() -> (NotificationReconciler, Arc<CartStore>, Arc<RecordingSink>) {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(CartStore::new(db.connection()));
        let sink = Arc::new(RecordingSink::new());
        let reconciler = NotificationReconciler::new(store.clone(), sink.clone());
        (reconciler, store, sink)
    }

    fn event(value: serde_json::Value) -> CartEventPayload {
        serde_json::from_value(value).unwrap()
    }

    fn minimal(cart_id: &str) -> CartEventPayload {
        event(json!({"cart_id": cart_id, "phone_number": "9876543210"}))
    }

    fn rich(cart_id: &str) -> CartEventPayload {
        event(json!({
            "cart_id": cart_id,
            "shipping_address": {"city": "Pune"},
            "items": [{"name": "X", "price": 100, "quantity": 1,
                       "img_url": "https://cdn.example.com/x.jpg"}]
        }))
    }

    #[tokio::test]
    async fn first_event_sends_new_message() {
        let (reconciler, store, sink) = setup().await;
        let action = reconciler.process(&minimal("c1")).await.unwrap();
        assert_eq!(action, ReconcileAction::SentNewMessage);

        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(record.notification_message_id.as_deref(), Some("m1"));
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test]
    async fn upgrade_sends_images_before_editing_text() {
        let (reconciler, _store, sink) = setup().await;
        reconciler.process(&minimal("c1")).await.unwrap();
        let action = reconciler.process(&rich("c1")).await.unwrap();
        assert_eq!(action, ReconcileAction::UpdatedMessage);

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SinkEvent::Sent(_)));
        match &events[1] {
            SinkEvent::Media(urls, caption) => {
                assert_eq!(urls, &vec!["https://cdn.example.com/x.jpg".to_string()]);
                assert_eq!(caption.as_deref(), Some(UPGRADE_IMAGES_CAPTION));
            }
            other => panic!("expected media batch before edit, got {other:?}"),
        }
        match &events[2] {
            SinkEvent::Edited(id, text) => {
                assert_eq!(id, "m1");
                assert!(text.contains("Pune"));
            }
            other => panic!("expected edit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn poorer_event_after_rich_is_suppressed_but_persists() {
        let (reconciler, store, sink) = setup().await;
        reconciler.process(&rich("c1")).await.unwrap();

        let poorer = event(json!({"cart_id": "c1", "phone_number": "1112223333"}));
        let action = reconciler.process(&poorer).await.unwrap();
        assert_eq!(action, ReconcileAction::NoMessage);

        // Record content stays current, nothing more went out.
        let record = store.get("c1").await.unwrap().unwrap();
        assert_eq!(record.phone.as_deref(), Some("1112223333"));
        assert_eq!(record.richness(), Richness::Abandoned);
        assert_eq!(sink.events().len(), 2); // media + send from the rich event
    }

    #[tokio::test]
    async fn repeated_richness_always_updates_never_resends() {
        let (reconciler, _store, sink) = setup().await;
        assert_eq!(
            reconciler.process(&minimal("c1")).await.unwrap(),
            ReconcileAction::SentNewMessage
        );
        for _ in 0..3 {
            assert_eq!(
                reconciler.process(&minimal("c1")).await.unwrap(),
                ReconcileAction::UpdatedMessage
            );
        }

        let events = sink.events();
        let sends = events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Sent(_)))
            .count();
        assert_eq!(sends, 1);
        // Repeats edit in place without an image batch.
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn record_without_message_id_gets_a_fresh_send() {
        let (reconciler, store, _sink) = setup().await;
        // Seed a record directly, bypassing the reconciler.
        store
            .upsert_from_event(&minimal("c1").to_fields().unwrap())
            .await
            .unwrap();

        let action = reconciler.process(&minimal("c1")).await.unwrap();
        assert_eq!(action, ReconcileAction::SentNewMessage);
    }

    #[tokio::test]
    async fn new_rich_cart_sends_images_then_message() {
        let (reconciler, _store, sink) = setup().await;
        reconciler.process(&rich("c2")).await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            SinkEvent::Media(_, caption) => {
                assert_eq!(caption.as_deref(), Some(NEW_IMAGES_CAPTION));
            }
            other => panic!("expected media batch first, got {other:?}"),
        }
        assert!(matches!(events[1], SinkEvent::Sent(_)));
    }

    #[tokio::test]
    async fn missing_cart_id_rejected_without_side_effects() {
        let (reconciler, store, sink) = setup().await;
        let bad = event(json!({"phone_number": "9876543210"}));
        let result = reconciler.process(&bad).await;
        assert!(matches!(result, Err(CartpulseError::InvalidPayload(_))));
        assert!(sink.events().is_empty());
        assert!(store.get("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cart_lock_entries_are_pruned_after_processing() {
        let (reconciler, _store, _sink) = setup().await;
        reconciler.process(&minimal("c1")).await.unwrap();
        reconciler.process(&rich("c2")).await.unwrap();
        reconciler.process(&rich("c1")).await.unwrap();
        assert!(reconciler.cart_locks.is_empty());
    }

    #[tokio::test]
    async fn scenario_phone_rich_phone() {
        let (reconciler, _store, sink) = setup().await;
        // A: bare cart id.
        assert_eq!(
            reconciler
                .process(&event(json!({"cart_id": "c1"})))
                .await
                .unwrap(),
            ReconcileAction::SentNewMessage
        );
        // B: rich payload upgrades in place.
        assert_eq!(
            reconciler.process(&rich("c1")).await.unwrap(),
            ReconcileAction::UpdatedMessage
        );
        // C: bare again is suppressed.
        assert_eq!(
            reconciler
                .process(&event(json!({"cart_id": "c1"})))
                .await
                .unwrap(),
            ReconcileAction::NoMessage
        );
        assert_eq!(sink.events().len(), 3); // send, media, edit, nothing
    }
}
