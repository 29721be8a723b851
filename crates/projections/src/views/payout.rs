//! Farmer payouts and per-order invoices.

use chrono::{DateTime, Utc};
use common::{Money, Order, OrderId, OrderStatus, Quantity};
use domain::OrderDetails;
use rust_decimal::Decimal;
use serde::Serialize;

pub const CURRENCY: &str = "INR";

/// Platform fee as a fraction of gross order value.
pub fn fee_rate() -> Decimal {
    Decimal::new(5, 2)
}

/// Splits a gross amount into `(fee, net)`.
pub fn split_gross(gross: Money) -> (Money, Money) {
    let fee = gross.percent_of(fee_rate());
    (fee, gross - fee)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutSummary {
    pub completed_orders: usize,
    /// Orders confirmed but not yet completed.
    pub pending_settlement: usize,
    pub total_gross: Money,
    pub platform_fee: Money,
    pub net_payout: Money,
    pub currency: &'static str,
}

pub fn payout_summary(orders: &[Order]) -> PayoutSummary {
    let mut completed_orders = 0;
    let mut pending_settlement = 0;
    let mut total_gross = Money::ZERO;
    for order in orders {
        if order.status == OrderStatus::Completed {
            completed_orders += 1;
            total_gross += order.total_price;
        }
        if order.status.is_in_flight() {
            pending_settlement += 1;
        }
    }

    let (platform_fee, net_payout) = split_gross(total_gross);
    PayoutSummary {
        completed_orders,
        pending_settlement,
        total_gross,
        platform_fee,
        net_payout,
        currency: CURRENCY,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub product_name: String,
    pub buyer_name: String,
    pub quantity: Quantity,
    pub unit: String,
    pub unit_price: Money,
    pub gross_amount: Money,
    pub platform_fee: Money,
    pub net_payout: Money,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub currency: &'static str,
}

/// Fee and net breakdown of one order.
///
/// The unit price is derived from the frozen total, not the product's
/// current price.
pub fn invoice(details: &OrderDetails) -> Invoice {
    let order = &details.order;
    let unit_price = if order.quantity.is_positive() {
        Money::new(order.total_price.amount() / order.quantity.value())
    } else {
        Money::ZERO
    };
    let (platform_fee, net_payout) = split_gross(order.total_price);

    Invoice {
        order_id: order.id,
        status: order.status,
        product_name: details
            .product
            .as_ref()
            .map(|p| p.crop_name.clone())
            .unwrap_or_default(),
        buyer_name: details.buyer_name().to_string(),
        quantity: order.quantity,
        unit: details.unit().to_string(),
        unit_price,
        gross_amount: order.total_price,
        platform_fee,
        net_payout,
        cancellation_reason: order.cancellation_reason.clone(),
        created_at: order.created_at,
        completed_at: order.completed_at,
        out_for_delivery_at: order.out_for_delivery_at,
        currency: CURRENCY,
    }
}
