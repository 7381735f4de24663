//! Core module containing the order model, the storage contract and the
//! derived computations over orders

pub mod error;
pub mod events;
pub mod order;
pub mod query;
pub mod service;
pub mod summary;

pub use error::{ConfigError, OrderError, StorageError};
pub use events::{EventBus, EventEnvelope, OrderEvent};
pub use order::{Measurements, Order, OrderDraft, OrderEdit, OrderStatus};
pub use query::{MonthYear, OrderFilter, OrderQuery};
pub use service::OrderStore;
pub use summary::DashboardSummary;
