//! # Measureon
//!
//! Order book for small tailoring and laundry shops.
//!
//! ## Features
//!
//! - **Orders**: customer number, garment counts, measurements, delivery date and price
//! - **Status Tracking**: pending → ready → delivered, plus shop-specific statuses
//! - **Storage Backends**: SQLite (feature `sqlite`, default) and in-memory
//! - **Failure-Contained Repository**: storage errors are logged, never surfaced
//! - **Dashboard**: counts and revenue, overall or per month
//! - **Customer Notifications**: templated messages when an order is ready or delivered
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use measureon::prelude::*;
//! use std::sync::Arc;
//!
//! let store = SqliteOrderStore::connect("sqlite://measureon.db").await?;
//! let repo = OrderRepository::new(Arc::new(store));
//!
//! let order = repo
//!     .place_order(
//!         OrderDraft {
//!             customer_number: "0300-1234567".into(),
//!             delivery_date: "2024-6-1".into(),
//!             shirts: 2,
//!             ..Default::default()
//!         },
//!         &PricingConfig::default(),
//!     )
//!     .await?;
//!
//! repo.mark_ready(order.order_number).await;
//! let summary = DashboardSummary::compute(&repo.get_all().await, &PricingConfig::default());
//! ```

pub mod config;
pub mod core;
pub mod notify;
pub mod repository;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        ConfigError, DashboardSummary, EventBus, EventEnvelope, Measurements, MonthYear, Order,
        OrderDraft, OrderEdit, OrderError, OrderEvent, OrderFilter, OrderQuery, OrderStatus,
        OrderStore, StorageError,
    };

    // === Configuration ===
    pub use crate::config::{DatabaseConfig, NotificationConfig, PricingConfig, ShopConfig};

    // === Repository ===
    pub use crate::repository::OrderRepository;

    // === Notifications ===
    pub use crate::notify::{
        CustomerNotifier, LogNotifier, MessageTemplates, NotificationDispatcher, OutboundMessage,
    };

    // === Storage ===
    pub use crate::storage::InMemoryOrderStore;
    #[cfg(feature = "sqlite")]
    pub use crate::storage::SqliteOrderStore;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
