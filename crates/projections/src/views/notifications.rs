//! Derived alerts for farmers and buyers.
//!
//! Nothing is stored: each call recomputes the alerts from current orders
//! and products.

use chrono::{DateTime, Duration, Utc};
use common::{DisputeStatus, Order, OrderStatus, Product, ProductStatus, Quantity};
use domain::OrderDetails;
use serde::Serialize;

pub const MAX_NOTIFICATIONS: usize = 20;

const FARMER_PENDING_HOURS: i64 = 24;
const FARMER_CRITICAL_HOURS: i64 = 48;
const FARMER_CANCELLED_WINDOW_HOURS: i64 = 72;
const BUYER_PENDING_HOURS: i64 = 12;
const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Order,
    Delivery,
    Dispute,
    Inventory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Critical,
}

impl Priority {
    fn label(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Stable key: `<reason>-<entity id>`.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn new(
        id: String,
        kind: NotificationKind,
        title: impl Into<String>,
        message: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            priority: None,
            title: title.into(),
            message,
            created_at,
        }
    }
}

/// Alerts for a farmer: stale pending orders, recent cancellations and
/// stock levels. Newest first, at most [`MAX_NOTIFICATIONS`].
pub fn farmer_notifications(
    orders: &[Order],
    products: &[Product],
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let mut items = Vec::new();

    for order in orders {
        if order.status == OrderStatus::Pending
            && order.created_at < now - Duration::hours(FARMER_PENDING_HOURS)
        {
            let priority = if order.created_at < now - Duration::hours(FARMER_CRITICAL_HOURS) {
                Priority::Critical
            } else {
                Priority::High
            };
            let mut item = Notification::new(
                format!("pending-{}", order.id),
                NotificationKind::Order,
                format!("Pending Order Alert ({})", priority.label()),
                format!(
                    "Order #{} is pending for more than 24 hours. Please act now.",
                    order.id
                ),
                order.created_at,
            );
            item.priority = Some(priority);
            items.push(item);
        }
        if order.status == OrderStatus::Cancelled
            && let Some(cancelled_at) = order.cancelled_at
            && cancelled_at > now - Duration::hours(FARMER_CANCELLED_WINDOW_HOURS)
        {
            items.push(Notification::new(
                format!("cancelled-{}", order.id),
                NotificationKind::Order,
                "Order Cancelled",
                format!("Order #{} was cancelled.", order.id),
                cancelled_at,
            ));
        }
    }

    let low_stock = Quantity::from(LOW_STOCK_THRESHOLD);
    for product in products {
        if product.quantity.is_positive() && product.quantity <= low_stock {
            items.push(Notification::new(
                format!("stock-{}", product.id),
                NotificationKind::Inventory,
                "Low Stock",
                format!(
                    "{} is running low ({} {}).",
                    product.crop_name, product.quantity, product.unit
                ),
                product.updated_at,
            ));
        }
        if !product.quantity.is_positive() && product.status != ProductStatus::Sold {
            items.push(Notification::new(
                format!("stockout-{}", product.id),
                NotificationKind::Inventory,
                "Out of Stock",
                format!("{} has no remaining inventory.", product.crop_name),
                product.updated_at,
            ));
        }
    }

    newest_first(items)
}

/// Alerts for a buyer about the progress of their orders and disputes.
/// Newest first, at most [`MAX_NOTIFICATIONS`].
pub fn buyer_notifications(orders: &[OrderDetails], now: DateTime<Utc>) -> Vec<Notification> {
    let mut items = Vec::new();

    for details in orders {
        let order = &details.order;
        let id = order.id;
        match order.status {
            OrderStatus::Pending
                if now - order.created_at >= Duration::hours(BUYER_PENDING_HOURS) =>
            {
                items.push(Notification::new(
                    format!("pending-{id}"),
                    NotificationKind::Order,
                    "Order Still Pending",
                    format!(
                        "Order #{id} for {} is still pending confirmation.",
                        details.product_name()
                    ),
                    order.created_at,
                ));
            }
            OrderStatus::Confirmed => {
                if let Some(at) = order.confirmed_at {
                    items.push(Notification::new(
                        format!("confirmed-{id}"),
                        NotificationKind::Order,
                        "Order Confirmed",
                        format!("Order #{id} has been confirmed by farmer."),
                        at,
                    ));
                }
            }
            OrderStatus::OutForDelivery => {
                if let Some(at) = order.out_for_delivery_at {
                    items.push(Notification::new(
                        format!("delivery-{id}"),
                        NotificationKind::Delivery,
                        "Out for Delivery",
                        format!("Order #{id} is out for delivery."),
                        at,
                    ));
                }
            }
            OrderStatus::Cancelled => {
                if let Some(at) = order.cancelled_at {
                    items.push(Notification::new(
                        format!("cancelled-{id}"),
                        NotificationKind::Order,
                        "Order Cancelled",
                        format!("Order #{id} was cancelled."),
                        at,
                    ));
                }
            }
            _ => {}
        }

        match order.dispute_status {
            DisputeStatus::Open => items.push(Notification::new(
                format!("dispute-open-{id}"),
                NotificationKind::Dispute,
                "Dispute Open",
                format!("Dispute for order #{id} is open."),
                order.updated_at,
            )),
            DisputeStatus::Resolved | DisputeStatus::Rejected => {
                items.push(Notification::new(
                    format!("dispute-closed-{id}"),
                    NotificationKind::Dispute,
                    "Dispute Updated",
                    format!("Dispute for order #{id} is {}.", order.dispute_status),
                    order.updated_at,
                ))
            }
            DisputeStatus::None => {}
        }
    }

    newest_first(items)
}

fn newest_first(mut items: Vec<Notification>) -> Vec<Notification> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(MAX_NOTIFICATIONS);
    items
}
