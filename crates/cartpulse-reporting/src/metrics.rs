// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report metrics aggregation.
//!
//! A single commutative fold over the fetched orders: every order counts
//! toward the grand total; classified orders additionally land in one
//! bucket. The per-order amount is `max(gross - tax, 0)`.

use cartpulse_carrier::CarrierOrder;
use cartpulse_core::StatusBucket;

use crate::classifier::classify;

/// Count and value of one status bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BucketTally {
    pub count: u64,
    pub value: f64,
}

impl BucketTally {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.value += amount;
    }
}

/// Metrics of one report run. Recomputed from scratch each run, never
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct OrderSummaryMetrics {
    pub total_orders: u64,
    pub total_order_value: f64,
    pub delivered: BucketTally,
    pub cancelled: BucketTally,
    pub undelivered: BucketTally,
    pub in_transit: BucketTally,
    pub returns: BucketTally,
}

impl OrderSummaryMetrics {
    /// Orders counted in the grand total but in no bucket.
    pub fn unclassified_count(&self) -> u64 {
        self.total_orders
            - self.delivered.count
            - self.cancelled.count
            - self.undelivered.count
            - self.in_transit.count
            - self.returns.count
    }
}

/// Aggregates metrics over a fetched order set. Iteration order does not
/// affect the result.
pub fn aggregate(orders: &[CarrierOrder]) -> OrderSummaryMetrics {
    let mut metrics = OrderSummaryMetrics::default();

    for order in orders {
        let amount = order.net_amount();
        metrics.total_orders += 1;
        metrics.total_order_value += amount;

        match classify(order.status_text(), order.status_code()) {
            StatusBucket::Delivered => metrics.delivered.add(amount),
            StatusBucket::Cancelled => metrics.cancelled.add(amount),
            StatusBucket::Undelivered => metrics.undelivered.add(amount),
            StatusBucket::InTransit => metrics.in_transit.add(amount),
            StatusBucket::Return => metrics.returns.add(amount),
            StatusBucket::Unclassified => {}
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(value: serde_json::Value) -> CarrierOrder {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_list_is_all_zero() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics.total_orders, 0);
        assert_eq!(metrics.total_order_value, 0.0);
        assert_eq!(metrics.delivered, BucketTally::default());
        assert_eq!(metrics.unclassified_count(), 0);
    }

    #[test]
    fn mixed_orders_scenario() {
        let orders = vec![
            order(json!({"id": 1, "status": "DELIVERED", "total": "100"})),
            order(json!({"id": 2, "status_code": 5, "total": "50"})),
            order(json!({"id": 3, "status": "RANDOM_TEXT", "total": "10"})),
        ];

        let metrics = aggregate(&orders);
        assert_eq!(metrics.delivered.count, 1);
        assert_eq!(metrics.delivered.value, 100.0);
        assert_eq!(metrics.cancelled.count, 1);
        assert_eq!(metrics.cancelled.value, 50.0);
        assert_eq!(metrics.total_orders, 3);
        assert_eq!(metrics.total_order_value, 160.0);
        assert_eq!(metrics.unclassified_count(), 1);
    }

    #[test]
    fn amount_is_gross_minus_tax_clamped() {
        let orders = vec![
            order(json!({"id": 1, "status": "DELIVERED", "total": "118", "tax": "18"})),
            order(json!({"id": 2, "status": "DELIVERED", "total": "10", "tax": "40"})),
        ];

        let metrics = aggregate(&orders);
        assert_eq!(metrics.delivered.count, 2);
        assert_eq!(metrics.delivered.value, 100.0);
        assert_eq!(metrics.total_order_value, 100.0);
    }

    #[test]
    fn totals_equal_buckets_plus_unclassified() {
        let orders = vec![
            order(json!({"id": 1, "status": "DELIVERED", "total": 100})),
            order(json!({"id": 2, "status": "RTO INITIATED", "total": 20})),
            order(json!({"id": 3, "status": "SHIPPED", "total": 30})),
            order(json!({"id": 4, "status": "???", "total": 5})),
            order(json!({"id": 5, "status_code": 36, "total": "15"})),
        ];

        let metrics = aggregate(&orders);
        let bucket_counts = metrics.delivered.count
            + metrics.cancelled.count
            + metrics.undelivered.count
            + metrics.in_transit.count
            + metrics.returns.count;
        assert_eq!(metrics.total_orders, bucket_counts + metrics.unclassified_count());

        let bucket_values = metrics.delivered.value
            + metrics.cancelled.value
            + metrics.undelivered.value
            + metrics.in_transit.value
            + metrics.returns.value;
        // Unclassified order value is 5.
        assert_eq!(metrics.total_order_value, bucket_values + 5.0);
    }

    #[test]
    fn iteration_order_does_not_matter() {
        let mut orders = vec![
            order(json!({"id": 1, "status": "DELIVERED", "total": "100"})),
            order(json!({"id": 2, "status_code": 5, "total": "50"})),
            order(json!({"id": 3, "status": "SHIPPED", "total": "25"})),
        ];
        let forward = aggregate(&orders);
        orders.reverse();
        let backward = aggregate(&orders);

        assert_eq!(forward.total_orders, backward.total_orders);
        assert_eq!(forward.total_order_value, backward.total_order_value);
        assert_eq!(forward.delivered, backward.delivered);
        assert_eq!(forward.cancelled, backward.cancelled);
        assert_eq!(forward.in_transit, backward.in_transit);
    }
}
