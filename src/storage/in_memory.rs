//! In-memory implementation of OrderStore for testing and development

use crate::core::{Order, OrderStore, StorageError};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Order>,
    last_id: i64,
}

/// In-memory order store
///
/// Mirrors the SQLite table: insertion order, ids that are never reused,
/// and a unique constraint on `order_number`. Uses RwLock for thread-safe
/// access.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryOrderStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, mut order: Order) -> Result<Order> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        if table
            .rows
            .iter()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StorageError::DuplicateOrderNumber(order.order_number).into());
        }

        table.last_id += 1;
        order.id = table.last_id;
        table.rows.push(order.clone());

        Ok(order)
    }

    async fn update(&self, order: Order) -> Result<bool> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(row) = table
            .rows
            .iter_mut()
            .find(|o| o.order_number == order.order_number)
        else {
            return Ok(false);
        };

        let id = row.id;
        *row = Order { id, ..order };
        Ok(true)
    }

    async fn delete(&self, order_number: i64) -> Result<()> {
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        table.rows.retain(|o| o.order_number != order_number);

        Ok(())
    }

    async fn get(&self, order_number: i64) -> Result<Option<Order>> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table
            .rows
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table.rows.clone())
    }

    async fn max_order_number(&self) -> Result<Option<i64>> {
        let table = self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(table.rows.iter().map(|o| o.order_number).max())
    }
}
