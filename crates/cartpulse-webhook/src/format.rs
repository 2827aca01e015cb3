// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML rendering of cart notifications.

use cartpulse_core::{ContactStatus, InlineButton, OutboundMessage};
use cartpulse_storage::CartRecord;
use serde_json::{Map, Value};

use crate::event::CartItem;

/// Caption sent with the image batch of a brand-new notification.
pub const NEW_IMAGES_CAPTION: &str = "\u{1f6cd}\u{fe0f} Product Images \u{2b07}\u{fe0f}";
/// Caption sent with the image batch of a richness upgrade.
pub const UPGRADE_IMAGES_CAPTION: &str = "\u{1f6cd}\u{fe0f} Product Images \u{2b06}\u{fe0f}";

fn status_emoji(status: ContactStatus) -> &'static str {
    match status {
        ContactStatus::NotContacted => "\u{1f534}",
        ContactStatus::CalledAndConverted => "\u{2705}",
        ContactStatus::CalledButNotConverted => "\u{274c}",
    }
}

fn format_currency(amount: f64) -> String {
    format!("\u{20b9}{amount:.2}")
}

/// Digits-only phone with the "91" country prefix applied when absent.
fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else if digits.starts_with("91") {
        Some(digits)
    } else {
        Some(format!("91{digits}"))
    }
}

/// Renders the notification for a cart record, including the seller's
/// current status and note so edits never lose them.
pub fn format_cart_message(record: &CartRecord) -> OutboundMessage {
    let mut lines = vec!["<b>\u{1f6d2} Cart Event</b>".to_string()];

    lines.push("\n<b>\u{1f464} Customer</b>".to_string());
    if let Some(ref name) = record.customer_name {
        lines.push(format!("\u{2022} Name: {name}"));
    }
    if let Some(ref email) = record.email {
        lines.push(format!("\u{2022} Email: {email}"));
    }
    lines.push(format!(
        "\u{2022} Phone: {}",
        record.phone.as_deref().unwrap_or("N/A")
    ));

    if let Some(address) = format_address(record.shipping_address_json.as_deref()) {
        lines.push("\n<b>\u{1f4e6} Shipping Address</b>".to_string());
        lines.push(address);
    }

    if let Some(items) = format_items(record.items_json.as_deref()) {
        lines.push("\n<b>\u{1f6cd}\u{fe0f} Items</b>".to_string());
        lines.push(items);
    }

    lines.push("\n<b>\u{1f4b0} Payment Summary</b>".to_string());
    lines.push(format!(
        "\u{2022} Total: {} {}",
        format_currency(record.total_price.unwrap_or(0.0)),
        record.currency.as_deref().unwrap_or("")
    )
    .trim_end()
    .to_string());

    lines.push("\n<b>\u{1f4cb} Cart Details</b>".to_string());
    lines.push(format!("\u{2022} Cart ID: {}", record.cart_id));
    if let Some(ref updated) = record.event_updated_at {
        lines.push(format!("\u{2022} Updated: {updated}"));
    }
    if let Some(ref url) = record.checkout_url {
        lines.push(format!("\u{2022} Checkout: {url}"));
    }

    lines.push(format!(
        "\n<b>\u{1f4ca} Status:</b> {} {}",
        status_emoji(record.status),
        record.status.as_str()
    ));
    lines.push("<b>\u{1f4dd} Notes</b>".to_string());
    lines.push(match record.note.as_deref() {
        Some(note) if !note.trim().is_empty() => note.to_string(),
        _ => "<i>No notes yet. Click \"Add Note\" to add one.</i>".to_string(),
    });

    let mut keyboard = Vec::new();
    if let Some(phone) = record.phone.as_deref().and_then(normalize_phone) {
        keyboard.push(vec![InlineButton::url(
            "WhatsApp",
            format!("https://wa.me/{phone}"),
        )]);
    }
    keyboard.push(vec![
        InlineButton::callback("Update Status", format!("cart:status:{}", record.cart_id)),
        InlineButton::callback("Add Note", format!("cart:note:{}", record.cart_id)),
    ]);

    OutboundMessage::html(lines.join("\n")).with_keyboard(keyboard)
}

fn format_address(address_json: Option<&str>) -> Option<String> {
    let address: Map<String, Value> = serde_json::from_str(address_json?).ok()?;
    if address.is_empty() {
        return None;
    }
    let parts: Vec<String> = ["name", "address1", "address2", "city", "state", "zip", "country"]
        .iter()
        .filter_map(|key| address.get(*key))
        .filter_map(|v| v.as_str())
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().to_string())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn format_items(items_json: Option<&str>) -> Option<String> {
    let items: Vec<CartItem> = serde_json::from_str(items_json?).ok()?;
    if items.is_empty() {
        return None;
    }
    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let name = item
                .name
                .clone()
                .or_else(|| item.title.clone())
                .unwrap_or_else(|| format!("Item {}", idx + 1));
            let mut line = format!(
                "{}. <b>{}</b>\n   \u{2022} Quantity: {}",
                idx + 1,
                name,
                item.quantity.unwrap_or(1)
            );
            if let Some(price) = item.price.as_ref().and_then(price_value) {
                line.push_str(&format!("\n   \u{2022} Price: {}", format_currency(price)));
            }
            if let Some(ref sku) = item.sku {
                line.push_str(&format!("\n   \u{2022} SKU: {sku}"));
            }
            line
        })
        .collect();
    Some(lines.join("\n"))
}

fn price_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
