//! The order record and the inputs that create and edit it

use crate::config::PricingConfig;
use crate::core::error::OrderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Separator between the shirt, pant and short measurement segments
pub const MEASUREMENT_DELIMITER: char = '|';

/// Lifecycle stage of an order
///
/// The normal progression is `pending → ready → delivered`, but nothing below
/// the UI enforces it: storage accepts any value, including strings that are
/// none of the three known stages (kept verbatim in [`OrderStatus::Other`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Ready,
    Delivered,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Other(s) => s,
        }
    }

    /// Parse a stored status string (exact, case-sensitive match)
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => OrderStatus::Pending,
            "ready" => OrderStatus::Ready,
            "delivered" => OrderStatus::Delivered,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Shirt, pant and short measurements, in garment order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurements {
    pub shirt: String,
    pub pant: String,
    pub short: String,
}

impl Measurements {
    pub fn new(
        shirt: impl Into<String>,
        pant: impl Into<String>,
        short: impl Into<String>,
    ) -> Self {
        Self {
            shirt: shirt.into(),
            pant: pant.into(),
            short: short.into(),
        }
    }

    /// Pack into the single stored field
    pub fn pack(&self) -> String {
        format!(
            "{}{d}{}{d}{}",
            self.shirt,
            self.pant,
            self.short,
            d = MEASUREMENT_DELIMITER
        )
    }

    /// Split a stored field; missing segments are empty, extra ones ignored
    pub fn unpack(packed: &str) -> Self {
        let mut segments = packed.split(MEASUREMENT_DELIMITER);
        let mut next = || segments.next().unwrap_or_default().to_string();
        let shirt = next();
        let pant = next();
        let short = next();
        Self { shirt, pant, short }
    }
}

/// One customer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Storage row id, assigned on insert (0 until stored)
    pub id: i64,
    /// Shop-facing sequential number, unique
    pub order_number: i64,
    /// Customer contact (phone)
    pub customer_number: String,
    /// Free-form delivery date, normally `year-month-day`
    pub delivery_date: String,
    pub shirts: u32,
    pub pants: u32,
    pub shorts: u32,
    /// Price computed when the order was taken
    pub total_price: f64,
    pub status: OrderStatus,
    pub is_starred: bool,
    pub is_ready: bool,
    pub is_delivered: bool,
    /// Packed measurements, see [`Measurements`]
    pub measurements: String,
    /// Opaque reference to an externally owned image
    pub image_uri: Option<String>,
}

impl Order {
    pub fn measurements(&self) -> Measurements {
        Measurements::unpack(&self.measurements)
    }

    /// Apply a full edit of the mutable fields
    ///
    /// `order_number`, `customer_number`, `total_price` and `status` are kept.
    pub fn apply_edit(&mut self, edit: OrderEdit) {
        self.shirts = edit.shirts;
        self.pants = edit.pants;
        self.shorts = edit.shorts;
        self.delivery_date = edit.delivery_date;
        self.is_ready = edit.is_ready;
        self.is_delivered = edit.is_delivered;
        self.is_starred = edit.is_starred;
        self.image_uri = edit.image_uri;
        self.measurements = edit.measurements.pack();
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Input of the take-order flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct OrderDraft {
    #[validate(custom(function = "not_blank"))]
    pub customer_number: String,
    #[validate(custom(function = "not_blank"))]
    pub delivery_date: String,
    pub shirts: u32,
    pub pants: u32,
    pub shorts: u32,
    pub measurements: Measurements,
    pub is_starred: bool,
    pub image_uri: Option<String>,
}

impl OrderDraft {
    /// Check the required details are present
    pub fn check(&self) -> Result<(), OrderError> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|k| k.to_string())
                .collect();
            fields.sort();
            OrderError::MissingDetails(fields)
        })
    }

    /// Build the pending order for a freshly allocated number
    pub fn into_order(self, order_number: i64, pricing: &PricingConfig) -> Order {
        let total_price = pricing.quote(self.shirts, self.pants, self.shorts);
        Order {
            id: 0,
            order_number,
            customer_number: self.customer_number,
            delivery_date: self.delivery_date,
            shirts: self.shirts,
            pants: self.pants,
            shorts: self.shorts,
            total_price,
            status: OrderStatus::Pending,
            is_starred: self.is_starred,
            is_ready: false,
            is_delivered: false,
            measurements: self.measurements.pack(),
            image_uri: self.image_uri,
        }
    }
}

/// Full replacement of an order's editable fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderEdit {
    pub shirts: u32,
    pub pants: u32,
    pub shorts: u32,
    pub delivery_date: String,
    pub is_ready: bool,
    pub is_delivered: bool,
    pub is_starred: bool,
    pub image_uri: Option<String>,
    pub measurements: Measurements,
}

impl From<&Order> for OrderEdit {
    /// Start an edit from the order's current values
    fn from(order: &Order) -> Self {
        Self {
            shirts: order.shirts,
            pants: order.pants,
            shorts: order.shorts,
            delivery_date: order.delivery_date.clone(),
            is_ready: order.is_ready,
            is_delivered: order.is_delivered,
            is_starred: order.is_starred,
            image_uri: order.image_uri.clone(),
            measurements: order.measurements(),
        }
    }
}
