//! Dashboard counts and revenue, recomputed from a fetched order list

use crate::config::PricingConfig;
use crate::core::order::{Order, OrderStatus};
use crate::core::query::MonthYear;
use serde::{Deserialize, Serialize};

/// Aggregates over a set of orders
///
/// `delivered + ready + pending` can be less than `total_orders` when orders
/// carry a status outside the three known stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_orders: usize,
    pub delivered: usize,
    pub ready: usize,
    pub pending: usize,
    pub shirts_delivered: u64,
    pub pants_delivered: u64,
    pub shorts_delivered: u64,
    /// Delivered garments priced at the current configuration, not at the
    /// price stored on each order
    pub revenue: f64,
}

impl DashboardSummary {
    pub fn compute(orders: &[Order], pricing: &PricingConfig) -> Self {
        let mut summary = Self {
            total_orders: orders.len(),
            ..Self::default()
        };

        for order in orders {
            match order.status {
                OrderStatus::Delivered => {
                    summary.delivered += 1;
                    summary.shirts_delivered += u64::from(order.shirts);
                    summary.pants_delivered += u64::from(order.pants);
                    summary.shorts_delivered += u64::from(order.shorts);
                }
                OrderStatus::Ready => summary.ready += 1,
                OrderStatus::Pending => summary.pending += 1,
                OrderStatus::Other(_) => {}
            }
        }

        summary.revenue = summary.shirts_delivered as f64 * pricing.shirt_price
            + summary.pants_delivered as f64 * pricing.pant_price
            + summary.shorts_delivered as f64 * pricing.short_price;
        summary
    }

    /// Summary of the orders due in the given month
    pub fn for_month(orders: &[Order], period: MonthYear, pricing: &PricingConfig) -> Self {
        Self::compute(&period.filter(orders), pricing)
    }
}
