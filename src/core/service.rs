//! Storage contract for orders

use crate::core::order::Order;
use anyhow::Result;
use async_trait::async_trait;

/// Service trait for persisting orders
///
/// One table keyed by an internal row id with a unique secondary key
/// (`order_number`). Writes addressed by order number are no-ops when the
/// order is absent; lookups return `None` rather than an error.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order, returning it with the storage-assigned id
    ///
    /// Fails with [`StorageError::DuplicateOrderNumber`](crate::core::StorageError)
    /// if the order number is already taken.
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Overwrite every mutable column of the row with the same order number
    ///
    /// Returns `false` when no such row exists.
    async fn update(&self, order: Order) -> Result<bool>;

    /// Delete an order by number
    async fn delete(&self, order_number: i64) -> Result<()>;

    /// Get an order by number
    async fn get(&self, order_number: i64) -> Result<Option<Order>>;

    /// List all orders in storage order
    async fn list(&self) -> Result<Vec<Order>>;

    /// Highest order number currently stored
    async fn max_order_number(&self) -> Result<Option<i64>>;
}
