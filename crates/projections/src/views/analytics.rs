//! Farmer sales analytics.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use common::{Money, OrderStatus, ProductId, Quantity};
use domain::OrderDetails;
use rust_decimal::Decimal;
use serde::Serialize;

use super::payout::CURRENCY;

const TOP_PRODUCTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub product_name: String,
    pub orders_count: usize,
    pub units_sold: Quantity,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub orders_total: usize,
    pub completed_orders: usize,
    /// Neither completed nor cancelled.
    pub pending_orders: usize,
    pub cancelled_orders: usize,
    /// Percent of all orders that completed.
    pub completion_rate: Decimal,
    pub average_order_value: Money,
    pub this_month_revenue: Money,
    pub last_month_revenue: Money,
    /// Percent change from last month; zero when last month had no revenue.
    pub revenue_growth: Decimal,
    pub top_products: Vec<TopProduct>,
    pub currency: &'static str,
}

/// Summarizes a farmer's orders as of `now`.
///
/// Monthly revenue buckets use UTC calendar months of order creation and
/// count completed orders only.
pub fn analytics(orders: &[OrderDetails], now: DateTime<Utc>) -> AnalyticsSummary {
    let this_month = month_start(now);
    let last_month = this_month
        .checked_sub_months(Months::new(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut completed_orders = 0;
    let mut pending_orders = 0;
    let mut cancelled_orders = 0;
    let mut completed_revenue = Money::ZERO;
    let mut this_month_revenue = Money::ZERO;
    let mut last_month_revenue = Money::ZERO;
    let mut tops: HashMap<ProductId, TopProduct> = HashMap::new();

    for details in orders {
        let order = &details.order;
        match order.status {
            OrderStatus::Completed => {
                completed_orders += 1;
                completed_revenue += order.total_price;
                if order.created_at >= this_month {
                    this_month_revenue += order.total_price;
                } else if order.created_at >= last_month {
                    last_month_revenue += order.total_price;
                }

                let top = tops.entry(order.product_id).or_insert_with(|| TopProduct {
                    product_id: order.product_id,
                    product_name: details
                        .product
                        .as_ref()
                        .map(|p| p.crop_name.clone())
                        .unwrap_or_default(),
                    orders_count: 0,
                    units_sold: Quantity::ZERO,
                    revenue: Money::ZERO,
                });
                top.orders_count += 1;
                top.units_sold += order.quantity;
                top.revenue += order.total_price;
            }
            OrderStatus::Cancelled => cancelled_orders += 1,
            _ => pending_orders += 1,
        }
    }

    let orders_total = orders.len();
    let completion_rate = if orders_total > 0 {
        Decimal::from(completed_orders) * Decimal::ONE_HUNDRED / Decimal::from(orders_total)
    } else {
        Decimal::ZERO
    };
    let revenue_growth = if last_month_revenue.is_positive() {
        (this_month_revenue - last_month_revenue).amount() * Decimal::ONE_HUNDRED
            / last_month_revenue.amount()
    } else {
        Decimal::ZERO
    };

    let mut top_products: Vec<_> = tops.into_values().collect();
    top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    top_products.truncate(TOP_PRODUCTS);

    AnalyticsSummary {
        orders_total,
        completed_orders,
        pending_orders,
        cancelled_orders,
        completion_rate,
        average_order_value: completed_revenue.average_over(completed_orders),
        this_month_revenue,
        last_month_revenue,
        revenue_growth,
        top_products,
        currency: CURRENCY,
    }
}

fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
