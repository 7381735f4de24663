//! Failure-contained facade over an [`OrderStore`]
//!
//! Every call is moved onto its own tokio task and awaited through the
//! `JoinHandle`. Dropping the caller's future (a closed screen, a cancelled
//! request) therefore does not cancel the storage write; only its result is
//! discarded.
//!
//! Storage failures never cross this boundary. They are logged and turned
//! into a safe default: nothing for writes, `None` for lookups, an empty
//! list for listings. Callers cannot tell "no orders" from "read failed", or
//! a completed write from a dropped one. Code that needs the failure should
//! talk to the store directly through [`OrderRepository::store`].
//!
//! Read-modify-write operations (`update_status`, `update_fields`) read and
//! write in two separate calls. Two concurrent updates of the same order can
//! lose one of the changes; the expected load is a single operator.

use crate::config::PricingConfig;
use crate::core::{
    EventBus, Order, OrderDraft, OrderEdit, OrderError, OrderEvent, OrderStatus, OrderStore,
};
use anyhow::{Result, anyhow};
use std::future::Future;
use std::sync::Arc;

/// Status reported by [`OrderRepository::status_of`] for a missing order
pub const UNKNOWN_STATUS: &str = "unknown";

/// Run `fut` on a detached task so it completes even if the caller goes away
async fn detached<T, Fut>(op: &'static str, fut: Fut) -> Result<T>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result,
        Err(e) => Err(anyhow!("{} task did not complete: {}", op, e)),
    }
}

/// Asynchronous order repository
///
/// Cheap to clone; clones share the store and the event bus.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn OrderStore>,
    events: EventBus,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self::with_event_bus(store, EventBus::default())
    }

    pub fn with_event_bus(store: Arc<dyn OrderStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Bus receiving an [`OrderEvent`] for every write that reached storage
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The underlying store, for callers that need storage errors
    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Insert an order; failures (including a duplicate order number) are
    /// only logged
    pub async fn insert(&self, order: Order) {
        let store = self.store.clone();
        let events = self.events.clone();
        let order_number = order.order_number;

        let result = detached("insert", async move {
            let stored = store.insert(order).await?;
            events.publish(OrderEvent::Created {
                order: stored.clone(),
            });
            Ok(stored)
        })
        .await;

        match result {
            Ok(stored) => {
                tracing::debug!(order_number, id = stored.id, "Order inserted successfully")
            }
            Err(e) => tracing::error!(order_number, error = %e, "Error inserting order"),
        }
    }

    /// Order by number; `None` when absent or when the read failed
    pub async fn get_by_id(&self, order_number: i64) -> Option<Order> {
        let store = self.store.clone();

        match detached("get", async move { store.get(order_number).await }).await {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(order_number, error = %e, "Error fetching order by number");
                None
            }
        }
    }

    /// All orders; empty when the read failed
    pub async fn get_all(&self) -> Vec<Order> {
        let store = self.store.clone();

        match detached("list", async move { store.list().await }).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching all orders");
                Vec::new()
            }
        }
    }

    /// Stored status string, or `"unknown"`
    pub async fn status_of(&self, order_number: i64) -> String {
        self.get_by_id(order_number)
            .await
            .map(|o| o.status.to_string())
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string())
    }

    /// Set the status of an order (read-modify-write)
    ///
    /// Any status is accepted, including skipping or reversing stages. The
    /// `is_ready`/`is_delivered` flags are left as they are. A missing order
    /// is logged and otherwise ignored.
    pub async fn update_status(&self, order_number: i64, status: OrderStatus) {
        let store = self.store.clone();
        let events = self.events.clone();
        let new_status = status.clone();

        let result = detached("update_status", async move {
            let Some(order) = store.get(order_number).await? else {
                return Ok(false);
            };

            let from = order.status.clone();
            let customer_number = order.customer_number.clone();
            let updated = store
                .update(Order {
                    status: new_status.clone(),
                    ..order
                })
                .await?;
            if !updated {
                return Ok(false);
            }

            events.publish(OrderEvent::StatusChanged {
                order_number,
                customer_number,
                from,
                to: new_status,
            });
            Ok(true)
        })
        .await;

        match result {
            Ok(true) => {
                tracing::info!(order_number, status = %status, "Order status updated")
            }
            Ok(false) => {
                tracing::error!(order_number, "Order not found for status update")
            }
            Err(e) => tracing::error!(order_number, error = %e, "Error updating order status"),
        }
    }

    pub async fn mark_ready(&self, order_number: i64) {
        self.update_status(order_number, OrderStatus::Ready).await
    }

    pub async fn mark_delivered(&self, order_number: i64) {
        self.update_status(order_number, OrderStatus::Delivered).await
    }

    /// Replace the editable fields of an order (read-modify-write)
    ///
    /// The order number, customer number, stored price and status are kept.
    pub async fn update_fields(&self, order_number: i64, edit: OrderEdit) {
        let store = self.store.clone();
        let events = self.events.clone();

        let result = detached("update_fields", async move {
            let Some(mut order) = store.get(order_number).await? else {
                return Ok(false);
            };

            order.apply_edit(edit);
            if !store.update(order.clone()).await? {
                return Ok(false);
            }
            events.publish(OrderEvent::Updated { order });
            Ok(true)
        })
        .await;

        match result {
            Ok(true) => tracing::info!(order_number, "Order updated successfully"),
            Ok(false) => tracing::error!(order_number, "Order not found for update"),
            Err(e) => tracing::error!(order_number, error = %e, "Error updating order"),
        }
    }

    /// Delete an order; absent orders are not an error
    pub async fn delete(&self, order_number: i64) {
        let store = self.store.clone();
        let events = self.events.clone();

        let result = detached("delete", async move {
            store.delete(order_number).await?;
            events.publish(OrderEvent::Deleted { order_number });
            Ok(())
        })
        .await;

        match result {
            Ok(()) => tracing::info!(order_number, "Order deleted"),
            Err(e) => tracing::error!(order_number, error = %e, "Error deleting order"),
        }
    }

    /// Current maximum order number plus one (1 for an empty table or a
    /// failed read)
    ///
    /// Not reserved: two callers racing before either inserts get the same
    /// number and the second insert fails on the unique constraint.
    pub async fn next_order_number(&self) -> i64 {
        let store = self.store.clone();

        match detached("max_order_number", async move { store.max_order_number().await }).await {
            Ok(max) => max.unwrap_or(0) + 1,
            Err(e) => {
                tracing::error!(error = %e, "Error getting next order number");
                1
            }
        }
    }

    /// Take-order flow: check the draft, allocate a number, price and insert
    ///
    /// Only missing details are reported. The insert itself goes through
    /// [`insert`](Self::insert), so a storage failure still yields the built
    /// order.
    pub async fn place_order(
        &self,
        draft: OrderDraft,
        pricing: &PricingConfig,
    ) -> Result<Order, OrderError> {
        draft.check()?;

        let order_number = self.next_order_number().await;
        let order = draft.into_order(order_number, pricing);
        self.insert(order.clone()).await;

        Ok(order)
    }
}
