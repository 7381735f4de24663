//! Shared test harness for order storage testing
//!
//! Provides order builders and assertions, plus the `order_store_tests!`
//! macro that runs the `OrderStore` contract against any backend.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

pub mod order_store_tests;

use measureon::core::{Measurements, Order, OrderStatus};

// ---------------------------------------------------------------------------
// Order builders
// ---------------------------------------------------------------------------

/// A pending order with one of each garment, delivered on `delivery_date`
pub fn order_on(order_number: i64, delivery_date: &str) -> Order {
    Order {
        id: 0,
        order_number,
        customer_number: format!("0300-{:07}", order_number),
        delivery_date: delivery_date.to_string(),
        shirts: 1,
        pants: 1,
        shorts: 1,
        total_price: 1350.0,
        status: OrderStatus::Pending,
        is_starred: false,
        is_ready: false,
        is_delivered: false,
        measurements: Measurements::new("38", "32", "30").pack(),
        image_uri: None,
    }
}

pub fn sample_order(order_number: i64) -> Order {
    order_on(order_number, "2024-5-20")
}

/// Orders numbered `1..=n`
pub fn sample_batch(n: i64) -> Vec<Order> {
    (1..=n).map(sample_order).collect()
}

/// Delivered order with the given garment counts
pub fn delivered_order(order_number: i64, shirts: u32, pants: u32, shorts: u32) -> Order {
    Order {
        shirts,
        pants,
        shorts,
        status: OrderStatus::Delivered,
        is_delivered: true,
        ..sample_order(order_number)
    }
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

pub fn order_numbers(orders: &[Order]) -> Vec<i64> {
    orders.iter().map(|o| o.order_number).collect()
}

/// Compare everything except the storage-assigned id
pub fn assert_same_order(actual: &Order, expected: &Order) {
    assert_eq!(
        Order {
            id: 0,
            ..actual.clone()
        },
        Order {
            id: 0,
            ..expected.clone()
        },
        "Order #{} differs from what was stored",
        expected.order_number
    );
}
