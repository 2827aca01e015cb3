// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrier status classification.
//!
//! Every order status maps to exactly one [`StatusBucket`]. Exact numeric
//! code membership always wins over text. Both code sets and keyword rules
//! are evaluated in a fixed priority order, Return first, so ambiguous
//! inputs (codes 45-48 appear in two upstream tables, "CANCELLATION
//! REQUESTED" carries several trigger words) resolve deterministically.
//!
//! The code and keyword tables are a compatibility contract with the
//! upstream carrier; do not edit them without cross-checking real traffic.

use cartpulse_core::StatusBucket;

const RETURN_CODES: &[i64] = &[
    9, 15, 16, 17, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 45, 46, 47, 48, 55, 68, 87,
];
const CANCELLED_CODES: &[i64] = &[5, 18, 54];
const DELIVERED_CODES: &[i64] = &[7, 38];
const UNDELIVERED_CODES: &[i64] = &[36, 50, 88, 89, 90];
const IN_TRANSIT_CODES: &[i64] = &[
    3, 4, 6, 19, 20, 34, 37, 43, 44, 45, 46, 47, 48, 62, 64, 65, 66, 67, 70, 71, 72, 73, 74, 75,
    76, 80, 81, 82, 83,
];

/// Classifies a carrier status into exactly one bucket.
pub fn classify(status_text: &str, status_code: Option<i64>) -> StatusBucket {
    if let Some(code) = status_code {
        if RETURN_CODES.contains(&code) {
            return StatusBucket::Return;
        }
        if CANCELLED_CODES.contains(&code) {
            return StatusBucket::Cancelled;
        }
        if DELIVERED_CODES.contains(&code) {
            return StatusBucket::Delivered;
        }
        if UNDELIVERED_CODES.contains(&code) {
            return StatusBucket::Undelivered;
        }
        if IN_TRANSIT_CODES.contains(&code) {
            return StatusBucket::InTransit;
        }
    }

    let text = status_text.to_uppercase();
    if is_return_text(&text) {
        StatusBucket::Return
    } else if is_cancelled_text(&text) {
        StatusBucket::Cancelled
    } else if is_delivered_text(&text) {
        StatusBucket::Delivered
    } else if is_undelivered_text(&text) {
        StatusBucket::Undelivered
    } else if is_in_transit_text(&text) {
        StatusBucket::InTransit
    } else {
        StatusBucket::Unclassified
    }
}

fn is_return_text(text: &str) -> bool {
    text.contains("RETURN") || text.contains("RTO")
}

fn is_cancelled_text(text: &str) -> bool {
    text.contains("CANCELLED") || text.contains("CANCELED") || text.contains("CANCELLATION REQUESTED")
}

fn is_delivered_text(text: &str) -> bool {
    // A bare "UNDELIVERED" must not land here, hence the leading space.
    text == "DELIVERED"
        || text.contains(" DELIVERED")
        || text == "ORDER DELIVERED"
        || text.contains("PARTIAL DELIVERED")
}

fn is_undelivered_text(text: &str) -> bool {
    text.contains("UNDELIVERED")
        || text.contains("NOT DELIVERED")
        || text.contains("FAILED DELIVERY")
        || text.contains("UNTRACEABLE")
        || text.contains("ISSUE_RELATED_TO_THE_RECIPIENT")
}

fn is_in_transit_text(text: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "TRANSIT",
        "OUT FOR DELIVERY",
        "OUT FOR PICKUP",
        "SHIPPED",
        "PICKUP",
        "QUEUED",
        "ALLOCATED",
        "SCHEDULED",
        "PACKED",
        "MANIFEST",
    ];
    KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_set_maps_to_its_bucket() {
        for &code in CANCELLED_CODES {
            if RETURN_CODES.contains(&code) {
                continue;
            }
            assert_eq!(classify("", Some(code)), StatusBucket::Cancelled);
        }
        for &code in DELIVERED_CODES {
            assert_eq!(classify("", Some(code)), StatusBucket::Delivered);
        }
        for &code in UNDELIVERED_CODES {
            assert_eq!(classify("", Some(code)), StatusBucket::Undelivered);
        }
        for &code in RETURN_CODES {
            assert_eq!(classify("", Some(code)), StatusBucket::Return);
        }
        for &code in IN_TRANSIT_CODES {
            if RETURN_CODES.contains(&code) {
                continue;
            }
            assert_eq!(classify("", Some(code)), StatusBucket::InTransit);
        }
    }

    #[test]
    fn overlapping_codes_resolve_to_return() {
        // 45-48 appear in both the return and in-transit tables upstream.
        for code in [45, 46, 47, 48] {
            assert_eq!(classify("", Some(code)), StatusBucket::Return);
        }
    }

    #[test]
    fn code_membership_wins_over_text() {
        assert_eq!(classify("DELIVERED", Some(5)), StatusBucket::Cancelled);
        assert_eq!(classify("IN TRANSIT", Some(7)), StatusBucket::Delivered);
    }

    #[test]
    fn keyword_priority_resolves_ambiguous_text() {
        // Carries both a return and a cancellation trigger word.
        assert_eq!(classify("RTO CANCELLED", None), StatusBucket::Return);
        // "CANCELLATION REQUESTED" must never fall through to transit.
        assert_eq!(
            classify("cancellation requested", None),
            StatusBucket::Cancelled
        );
    }

    #[test]
    fn delivered_text_rules() {
        assert_eq!(classify("DELIVERED", None), StatusBucket::Delivered);
        assert_eq!(classify("Order Delivered", None), StatusBucket::Delivered);
        assert_eq!(classify("PARTIAL DELIVERED", None), StatusBucket::Delivered);
        // Bare "UNDELIVERED" contains no " DELIVERED" and falls through.
        assert_eq!(classify("UNDELIVERED", None), StatusBucket::Undelivered);
    }

    #[test]
    fn undelivered_and_transit_text_rules() {
        assert_eq!(classify("FAILED DELIVERY", None), StatusBucket::Undelivered);
        assert_eq!(classify("UNTRACEABLE", None), StatusBucket::Undelivered);
        assert_eq!(classify("OUT FOR DELIVERY", None), StatusBucket::InTransit);
        assert_eq!(classify("PICKUP SCHEDULED", None), StatusBucket::InTransit);
        assert_eq!(classify("MANIFEST GENERATED", None), StatusBucket::InTransit);
    }

    #[test]
    fn classification_is_total() {
        let texts = [
            "", "DELIVERED", "UNDELIVERED", "RTO", "CANCELLED", "SHIPPED", "RANDOM_TEXT",
            "cancellation requested", "NOT DELIVERED",
        ];
        let codes = [None, Some(0), Some(5), Some(7), Some(36), Some(45), Some(999)];
        for text in texts {
            for code in codes {
                // classify returns exactly one bucket for any input.
                let _ = classify(text, code);
            }
        }
    }

    #[test]
    fn unknown_input_is_unclassified() {
        assert_eq!(classify("RANDOM_TEXT", None), StatusBucket::Unclassified);
        assert_eq!(classify("", Some(999)), StatusBucket::Unclassified);
        assert_eq!(classify("", None), StatusBucket::Unclassified);
    }
}
