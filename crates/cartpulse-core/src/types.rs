// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Cartpulse workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of an outstanding chat message, as returned by the sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Information richness of an inbound cart event.
///
/// An event that carries only contact data (typically just a phone number)
/// is `PhoneReceived`; one that also carries a shipping address or item
/// detail is `Abandoned`. A later `PhoneReceived` event must never regress
/// an `Abandoned` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum Richness {
    PhoneReceived,
    Abandoned,
}

/// Mutually exclusive classification of a carrier order status.
///
/// `Unclassified` orders count toward the grand total of a report but
/// belong to no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum StatusBucket {
    Delivered,
    Cancelled,
    Undelivered,
    InTransit,
    Return,
    Unclassified,
}

/// Reporting cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ReportPeriod {
    /// All periods, in a fixed order usable for per-period state arrays.
    pub const ALL: [ReportPeriod; 3] =
        [ReportPeriod::Daily, ReportPeriod::Weekly, ReportPeriod::Monthly];

    /// Stable index into per-period state arrays.
    pub fn index(self) -> usize {
        match self {
            ReportPeriod::Daily => 0,
            ReportPeriod::Weekly => 1,
            ReportPeriod::Monthly => 2,
        }
    }
}

/// Seller-entered contact status attached to carts and undelivered orders.
///
/// Persisted as the human-readable strings the original records used, and
/// immune to event/carrier re-sync overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactStatus {
    NotContacted,
    CalledAndConverted,
    CalledButNotConverted,
}

impl ContactStatus {
    /// The storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::NotContacted => "Not Contacted",
            ContactStatus::CalledAndConverted => "Called and Converted",
            ContactStatus::CalledButNotConverted => "Called but Not Converted",
        }
    }

    /// Parses the storage representation, defaulting to `NotContacted`.
    pub fn from_str_value(value: &str) -> Self {
        match value {
            "Called and Converted" => ContactStatus::CalledAndConverted,
            "Called but Not Converted" => ContactStatus::CalledButNotConverted,
            _ => ContactStatus::NotContacted,
        }
    }

    /// Advances through the fixed 3-state ring used by the manual
    /// status-update action.
    pub fn advance(self) -> Self {
        match self {
            ContactStatus::NotContacted => ContactStatus::CalledAndConverted,
            ContactStatus::CalledAndConverted => ContactStatus::CalledButNotConverted,
            ContactStatus::CalledButNotConverted => ContactStatus::NotContacted,
        }
    }
}

impl Default for ContactStatus {
    fn default() -> Self {
        ContactStatus::NotContacted
    }
}

/// One button of an inline keyboard attached to an outbound message.
///
/// Exactly one of `url` / `callback_data` is expected to be set; sinks may
/// ignore buttons with neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub callback_data: Option<String>,
}

impl InlineButton {
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: Some(url.into()),
            callback_data: None,
        }
    }

    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
            callback_data: Some(data.into()),
        }
    }
}

/// Rows of inline buttons.
pub type InlineKeyboard = Vec<Vec<InlineButton>>;

/// A message to be delivered (or edited in place) by a [`crate::MessageSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    /// Parse mode hint for the sink ("HTML" for the Telegram sink).
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default)]
    pub keyboard: Option<InlineKeyboard>,
}

impl OutboundMessage {
    /// An HTML-formatted message without a keyboard.
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some("HTML".into()),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn contact_status_ring_cycles() {
        let mut status = ContactStatus::NotContacted;
        status = status.advance();
        assert_eq!(status, ContactStatus::CalledAndConverted);
        status = status.advance();
        assert_eq!(status, ContactStatus::CalledButNotConverted);
        status = status.advance();
        assert_eq!(status, ContactStatus::NotContacted);
    }

    #[test]
    fn contact_status_storage_roundtrip() {
        for status in [
            ContactStatus::NotContacted,
            ContactStatus::CalledAndConverted,
            ContactStatus::CalledButNotConverted,
        ] {
            assert_eq!(ContactStatus::from_str_value(status.as_str()), status);
        }
        // Unknown strings fall back to the default.
        assert_eq!(
            ContactStatus::from_str_value("garbage"),
            ContactStatus::NotContacted
        );
    }

    #[test]
    fn report_period_parses_lowercase() {
        assert_eq!(ReportPeriod::from_str("daily").unwrap(), ReportPeriod::Daily);
        assert_eq!(ReportPeriod::Weekly.to_string(), "weekly");
        assert_eq!(ReportPeriod::Monthly.index(), 2);
    }

    #[test]
    fn outbound_message_builders() {
        let msg = OutboundMessage::html("hello")
            .with_keyboard(vec![vec![InlineButton::callback("Update", "cart:status:c1")]]);
        assert_eq!(msg.parse_mode.as_deref(), Some("HTML"));
        let button = &msg.keyboard.unwrap()[0][0];
        assert_eq!(button.callback_data.as_deref(), Some("cart:status:c1"));
        assert!(button.url.is_none());
    }
}
