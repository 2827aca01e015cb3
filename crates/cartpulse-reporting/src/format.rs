// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML message rendering for reports and undelivered-order notifications.

use cartpulse_carrier::OrderProduct;
use cartpulse_core::{ContactStatus, InlineButton, OutboundMessage, ReportPeriod};
use cartpulse_storage::UndeliveredOrderRecord;
use chrono::NaiveDate;

use crate::metrics::OrderSummaryMetrics;

/// Renders an amount as rupees with two decimals.
pub fn format_currency(amount: f64) -> String {
    format!("\u{20b9}{amount:.2}")
}

/// Renders `count/total` as a percentage with one decimal. A zero total
/// renders as the literal "0%".
pub fn format_rate(count: u64, total: u64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let rate = count as f64 / total as f64 * 100.0;
    format!("{rate:.1}%")
}

/// Normalizes a phone number for WhatsApp deep links: digits only, with
/// the "91" country prefix applied when absent. Returns None when no
/// digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else if digits.starts_with("91") {
        Some(digits)
    } else {
        Some(format!("91{digits}"))
    }
}

fn period_label(period: ReportPeriod) -> &'static str {
    match period {
        ReportPeriod::Daily => "Daily",
        ReportPeriod::Weekly => "Weekly",
        ReportPeriod::Monthly => "Monthly",
    }
}

/// Renders the periodic order summary report.
pub fn format_report(
    period: ReportPeriod,
    start: NaiveDate,
    end: NaiveDate,
    metrics: &OrderSummaryMetrics,
) -> String {
    let start_str = start.format("%d %b %Y").to_string();
    let end_str = end.format("%d %b %Y").to_string();
    let total = metrics.total_orders;

    [
        format!("<b>\u{1f4e6} {} Order Report</b>", period_label(period)),
        format!("\u{1f5d3} <b>Period:</b> {start_str} \u{2192} {end_str}"),
        String::new(),
        "<b>\u{1f4ca} Totals</b>".to_string(),
        format!("\u{2022} Orders: <b>{total}</b>"),
        format!(
            "\u{2022} Value: <b>{}</b>",
            format_currency(metrics.total_order_value)
        ),
        String::new(),
        "<b>\u{1f6a5} Status Split</b>".to_string(),
        format!(
            "\u{2705} Delivered: <b>{}</b> ({}) \u{2014} {}",
            metrics.delivered.count,
            format_currency(metrics.delivered.value),
            format_rate(metrics.delivered.count, total)
        ),
        format!(
            "\u{1f6ab} Cancelled: <b>{}</b> ({}) \u{2014} {}",
            metrics.cancelled.count,
            format_currency(metrics.cancelled.value),
            format_rate(metrics.cancelled.count, total)
        ),
        format!(
            "\u{26a0}\u{fe0f} Undelivered: <b>{}</b> ({}) \u{2014} {}",
            metrics.undelivered.count,
            format_currency(metrics.undelivered.value),
            format_rate(metrics.undelivered.count, total)
        ),
        format!(
            "\u{1f4e6} In Transit: <b>{}</b> ({}) \u{2014} {}",
            metrics.in_transit.count,
            format_currency(metrics.in_transit.value),
            format_rate(metrics.in_transit.count, total)
        ),
        format!(
            "\u{21a9}\u{fe0f} Returns: <b>{}</b> ({}) \u{2014} {}",
            metrics.returns.count,
            format_currency(metrics.returns.value),
            format_rate(metrics.returns.count, total)
        ),
    ]
    .join("\n")
}

fn seller_status_emoji(status: ContactStatus) -> &'static str {
    match status {
        ContactStatus::NotContacted => "\u{1f534}",
        ContactStatus::CalledAndConverted => "\u{2705}",
        ContactStatus::CalledButNotConverted => "\u{274c}",
    }
}

/// Renders the notification for one undelivered order, with a WhatsApp
/// deep-link button (when a phone is known) and the manual-action buttons.
pub fn format_undelivered_message(record: &UndeliveredOrderRecord) -> OutboundMessage {
    let fields = &record.fields;
    let phone = fields
        .customer_phone
        .as_deref()
        .and_then(normalize_phone);
    let order_code = fields
        .channel_order_id
        .clone()
        .unwrap_or_else(|| fields.order_id.clone());
    let status_text = fields.status_text.as_deref().unwrap_or("Undelivered");

    let mut lines = vec![
        "<b>\u{1f6a8} Undelivered Order</b>".to_string(),
        format!("Order: {order_code}"),
        match fields.status_code {
            Some(code) => format!("Status: {status_text} (code {code})"),
            None => format!("Status: {status_text}"),
        },
        "\n<b>\u{1f464} Customer</b>".to_string(),
        fields
            .customer_name
            .clone()
            .unwrap_or_else(|| "N/A".to_string()),
    ];
    if let Some(ref email) = fields.customer_email {
        lines.push(email.clone());
    }
    if let Some(ref phone) = phone {
        lines.push(format!("+{phone}"));
    }

    let address: String = [
        &fields.customer_address,
        &fields.customer_city,
        &fields.customer_state,
        &fields.customer_pincode,
    ]
    .into_iter()
    .filter_map(|part| part.as_deref())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ");
    if !address.is_empty() {
        lines.push("\n<b>\u{1f4e6} Shipping Address</b>".to_string());
        lines.push(address);
    }

    if let Some(items) = format_products(fields.products_json.as_deref()) {
        lines.push("\n<b>\u{1f6d2} Items</b>".to_string());
        lines.push(items);
    }

    lines.push("\n<b>\u{1f4b0} Payment Summary</b>".to_string());
    lines.push(format!(
        "\u{2022} Value: {}",
        format_currency(fields.total.unwrap_or(0.0))
    ));

    lines.push("\n<b>\u{1f4ca} Status & Notes</b>".to_string());
    lines.push(format!(
        "{} {}",
        seller_status_emoji(record.seller_status),
        record.seller_status.as_str()
    ));
    lines.push(match record.seller_note.as_deref() {
        Some(note) if !note.trim().is_empty() => note.to_string(),
        _ => "<i>No notes</i>".to_string(),
    });

    let mut keyboard = Vec::new();
    if let Some(ref phone) = phone {
        keyboard.push(vec![InlineButton::url(
            "WhatsApp",
            format!("https://wa.me/{phone}"),
        )]);
    }
    keyboard.push(vec![
        InlineButton::callback(
            "Update Status",
            format!("undelivered:update:{}", fields.order_id),
        ),
        InlineButton::callback("Add Note", format!("undelivered:note:{}", fields.order_id)),
    ]);

    OutboundMessage::html(lines.join("\n")).with_keyboard(keyboard)
}

fn format_products(products_json: Option<&str>) -> Option<String> {
    let products: Vec<OrderProduct> = serde_json::from_str(products_json?).ok()?;
    if products.is_empty() {
        return None;
    }
    let lines: Vec<String> = products
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let name = item
                .name
                .clone()
                .or_else(|| item.channel_sku.clone())
                .unwrap_or_else(|| format!("Item {}", idx + 1));
            format!(
                "{}. <b>{}</b>\n   \u{2022} Qty: {}\n   \u{2022} Value: {}",
                idx + 1,
                name,
                item.quantity.unwrap_or(1),
                format_currency(item.unit_price())
            )
        })
        .collect();
    Some(lines.join("\n"))
}
