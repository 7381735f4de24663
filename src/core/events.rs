//! Order events for notifications and other observers
//!
//! The repository publishes an [`OrderEvent`] on the [`EventBus`] after each
//! write that reached storage. The bus uses `tokio::sync::broadcast`, so
//! writers never wait on observers such as the customer notification
//! dispatcher.
//!
//! # Architecture
//!
//! ```text
//! OrderRepository ──▶ EventBus::publish() ──▶ broadcast channel ──▶ NotificationDispatcher
//!                                                               ──▶ other subscribers
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let event_bus = EventBus::new(64);
//! let mut rx = event_bus.subscribe();
//!
//! event_bus.publish(OrderEvent::Deleted { order_number: 4 });
//!
//! if let Ok(envelope) = rx.recv().await {
//!     println!("{} #{}", envelope.event.action(), envelope.event.order_number());
//! }
//! ```

use crate::core::order::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

/// Mutations of the order table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderEvent {
    /// A new order was stored
    Created { order: Order },
    /// `update_status` rewrote the status of an order
    StatusChanged {
        order_number: i64,
        customer_number: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// The editable fields of an order were replaced
    Updated { order: Order },
    /// An order was deleted (or was already absent)
    Deleted { order_number: i64 },
}

impl OrderEvent {
    /// Order number this event relates to
    pub fn order_number(&self) -> i64 {
        match self {
            OrderEvent::Created { order } | OrderEvent::Updated { order } => order.order_number,
            OrderEvent::StatusChanged { order_number, .. }
            | OrderEvent::Deleted { order_number } => *order_number,
        }
    }

    /// Get the action name
    pub fn action(&self) -> &str {
        match self {
            OrderEvent::Created { .. } => "created",
            OrderEvent::StatusChanged { .. } => "status_changed",
            OrderEvent::Updated { .. } => "updated",
            OrderEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Envelope wrapping an order event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: OrderEvent,
}

impl EventEnvelope {
    /// Create a new event envelope
    pub fn new(event: OrderEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; every clone feeds the same channel. The channel closes
/// once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails: with no subscribers the event is dropped. Returns the
    /// number of receivers that will see it.
    pub fn publish(&self, event: OrderEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Subscribe as a `Stream`; a lagged receiver yields a
    /// `BroadcastStreamRecvError::Lagged` item and the stream ends when the
    /// bus is closed
    pub fn stream(&self) -> BroadcastStream<EventEnvelope> {
        BroadcastStream::new(self.subscribe())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
