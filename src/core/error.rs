//! Typed errors for the order book
//!
//! Storage backends return `anyhow::Result` like the rest of the crate, but
//! wrap a [`StorageError`] when a caller may want to branch on the failure
//! (for example a duplicate order number). The take-order flow reports
//! [`OrderError`], and configuration loading reports [`ConfigError`].
//!
//! # Example
//!
//! ```rust,ignore
//! match store.insert(order).await {
//!     Ok(stored) => println!("stored #{}", stored.order_number),
//!     Err(e) => match e.downcast_ref::<StorageError>() {
//!         Some(StorageError::DuplicateOrderNumber(n)) => eprintln!("#{} already taken", n),
//!         _ => eprintln!("insert failed: {}", e),
//!     },
//! }
//! ```

use thiserror::Error;

/// Errors raised by order storage backends
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The unique constraint on `order_number` rejected an insert
    #[error("Order number {0} already exists")]
    DuplicateOrderNumber(i64),

    /// A stored row could not be mapped back into an [`Order`](crate::core::Order)
    #[error("Invalid row for order #{order_number}: {message}")]
    InvalidRow { order_number: i64, message: String },
}

/// Errors raised while taking or editing an order
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Customer number or delivery date left blank
    #[error("Please enter all details: {}", .0.join(", "))]
    MissingDetails(Vec<String>),
}

/// Errors related to configuration parsing and persistence
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading or writing configuration
    #[error("IO error on '{path}': {message}")]
    IoError { path: String, message: String },
}
