//! Rolling weekly and monthly summaries.

use chrono::{DateTime, Duration, Months, Utc};
use common::{Money, Order, OrderStatus};
use serde::Serialize;

use super::payout::{CURRENCY, split_gross};
use crate::error::ProjectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }

    /// Start of the window ending at `end`.
    pub fn start(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Weekly => end - Duration::days(7),
            Period::Monthly => end
                .checked_sub_months(Months::new(1))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            other => Err(ProjectionError::InvalidPeriod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub orders_count: usize,
    pub completed_orders: usize,
    pub cancelled_orders: usize,
    pub pending_orders: usize,
    pub gross_revenue: Money,
    pub platform_fees: Money,
    pub net_payout: Money,
    /// Gross revenue over all orders in the window, not just completed ones.
    pub average_order_size: Money,
    pub currency: &'static str,
}

/// Buckets orders created inside the window `[start, now]`.
pub fn period_summary(orders: &[Order], period: Period, now: DateTime<Utc>) -> PeriodSummary {
    let start = period.start(now);

    let mut orders_count = 0;
    let mut completed_orders = 0;
    let mut cancelled_orders = 0;
    let mut pending_orders = 0;
    let mut gross_revenue = Money::ZERO;
    for order in orders
        .iter()
        .filter(|o| o.created_at >= start && o.created_at <= now)
    {
        orders_count += 1;
        match order.status {
            OrderStatus::Completed => {
                completed_orders += 1;
                gross_revenue += order.total_price;
            }
            OrderStatus::Cancelled => cancelled_orders += 1,
            _ => pending_orders += 1,
        }
    }

    let (platform_fees, net_payout) = split_gross(gross_revenue);
    PeriodSummary {
        period,
        period_start: start,
        period_end: now,
        orders_count,
        completed_orders,
        cancelled_orders,
        pending_orders,
        gross_revenue,
        platform_fees,
        net_payout,
        average_order_size: gross_revenue.average_over(orders_count),
        currency: CURRENCY,
    }
}
