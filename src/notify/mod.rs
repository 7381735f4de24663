//! Customer notifications on order status changes
//!
//! The [`NotificationDispatcher`] subscribes to the repository's
//! [`EventBus`](crate::core::EventBus) and sends one message to the customer
//! when an order becomes ready and another when it is delivered.
//!
//! ```text
//! EventBus::stream() ──▶ NotificationDispatcher::run()
//!                               │
//!                         StatusChanged to ready/delivered?
//!                               │
//!                         ──yes──▶ render template ──▶ CustomerNotifier::send()
//! ```
//!
//! A failed send is logged and dropped. There is no retry and no delivery
//! report.

use crate::config::NotificationConfig;
use crate::core::events::{EventEnvelope, OrderEvent};
use crate::core::order::OrderStatus;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::{Context, Tera};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// A text message for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Customer phone number as stored on the order
    pub to: String,
    pub body: String,
}

/// Outbound channel to customers (SMS gateway, messaging app, ...)
#[async_trait]
pub trait CustomerNotifier: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}

/// Notifier that only writes the message to the log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl CustomerNotifier for LogNotifier {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        tracing::info!(to = %message.to, body = %message.body, "Customer notification");
        Ok(())
    }
}

/// Message templates for the two notified transitions
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplates {
    pub ready: String,
    pub delivered: String,
}

impl MessageTemplates {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            ready: config.ready_template.clone(),
            delivered: config.delivered_template.clone(),
        }
    }

    /// Render the message for a transition into `status`
    ///
    /// Returns `Ok(None)` for statuses that are not notified.
    pub fn render(
        &self,
        status: &OrderStatus,
        order_number: i64,
        customer_number: &str,
    ) -> Result<Option<String>> {
        let template = match status {
            OrderStatus::Ready => &self.ready,
            OrderStatus::Delivered => &self.delivered,
            _ => return Ok(None),
        };

        let mut context = Context::new();
        context.insert("order_number", &order_number);
        context.insert("customer_number", customer_number);

        Tera::one_off(template, &context, false)
            .map(Some)
            .map_err(|e| anyhow!("Failed to render {} message: {}", status, e))
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

/// Turns status events into customer messages
pub struct NotificationDispatcher {
    notifier: Arc<dyn CustomerNotifier>,
    templates: MessageTemplates,
    enabled: bool,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn CustomerNotifier>, templates: MessageTemplates) -> Self {
        Self {
            notifier,
            templates,
            enabled: true,
        }
    }

    pub fn from_config(notifier: Arc<dyn CustomerNotifier>, config: &NotificationConfig) -> Self {
        Self {
            notifier,
            templates: MessageTemplates::from_config(config),
            enabled: config.enabled,
        }
    }

    /// Handle a single event; returns whether a message was sent
    pub async fn handle(&self, envelope: &EventEnvelope) -> bool {
        if !self.enabled {
            return false;
        }

        let OrderEvent::StatusChanged {
            order_number,
            customer_number,
            to,
            ..
        } = &envelope.event
        else {
            return false;
        };

        let body = match self.templates.render(to, *order_number, customer_number) {
            Ok(Some(body)) => body,
            Ok(None) => return false,
            Err(e) => {
                tracing::error!(order_number, error = %e, "Notification not sent");
                return false;
            }
        };

        let message = OutboundMessage {
            to: customer_number.clone(),
            body,
        };

        match self.notifier.send(message).await {
            Ok(()) => {
                tracing::debug!(order_number, status = %to, "Customer notified");
                true
            }
            Err(e) => {
                tracing::warn!(order_number, error = %e, "Failed to notify customer");
                false
            }
        }
    }

    /// Consume events from [`EventBus::stream`](crate::core::EventBus::stream)
    /// until the bus is closed
    ///
    /// Returns the number of messages sent.
    pub async fn run(&self, mut events: BroadcastStream<EventEnvelope>) -> usize {
        tracing::info!("Notification dispatcher started");
        let mut sent = 0;

        while let Some(item) = events.next().await {
            match item {
                Ok(envelope) => {
                    if self.handle(&envelope).await {
                        sent += 1;
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(count)) => {
                    tracing::warn!(
                        count = count,
                        "Notification dispatcher lagged, {} events skipped",
                        count
                    );
                }
            }
        }

        tracing::info!("EventBus closed, stopping notification dispatcher");
        sent
    }
}
