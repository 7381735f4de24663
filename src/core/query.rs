//! Listing filters: search, quick filters and month/year selection

use crate::core::order::{Order, OrderStatus};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Pattern of `delivery_date` (month and day may be unpadded)
pub const DELIVERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a delivery date loosely; `None` when it does not match the pattern
///
/// A day of 29 to 31 past the end of its month is clamped to the month's
/// last day, so `2024-2-30` reads as 2024-02-29.
pub fn parse_delivery_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DELIVERY_DATE_FORMAT)
        .ok()
        .or_else(|| clamp_day_overflow(value))
}

fn clamp_day_overflow(value: &str) -> Option<NaiveDate> {
    let mut parts = value.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(29..=31).contains(&day) {
        return None;
    }

    (28..day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

/// Quick filter on the order list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderFilter {
    #[default]
    All,
    /// Anything not yet delivered
    Undelivered,
    Starred,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::Undelivered => order.status != OrderStatus::Delivered,
            OrderFilter::Starred => order.is_starred,
        }
    }
}

impl FromStr for OrderFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(OrderFilter::All),
            "undelivered" | "udo" => Ok(OrderFilter::Undelivered),
            "starred" | "so" => Ok(OrderFilter::Starred),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// Search text plus quick filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    /// Matched against the order number and the customer number
    pub search: String,
    pub filter: OrderFilter,
}

impl OrderQuery {
    pub fn new(search: impl Into<String>, filter: OrderFilter) -> Self {
        Self {
            search: search.into(),
            filter,
        }
    }

    pub fn matches_search(&self, order: &Order) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        order.order_number.to_string().contains(&needle)
            || order.customer_number.to_lowercase().contains(&needle)
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.matches_search(order) && self.filter.matches(order)
    }

    /// Matching orders, in input order
    pub fn apply(&self, orders: &[Order]) -> Vec<Order> {
        orders.iter().filter(|o| self.matches(o)).cloned().collect()
    }
}

/// Delivery month selection for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthYear {
    /// 1-based month
    pub month: u32,
    pub year: i32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    /// Month containing the given date
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// Unparsable delivery dates never match
    pub fn contains(&self, order: &Order) -> bool {
        parse_delivery_date(&order.delivery_date)
            .is_some_and(|d| d.month() == self.month && d.year() == self.year)
    }

    pub fn filter(&self, orders: &[Order]) -> Vec<Order> {
        orders.iter().filter(|o| self.contains(o)).cloned().collect()
    }
}
