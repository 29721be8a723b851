use chrono::{DateTime, Utc};
use common::{Order, OrderStatus, OrderStatusLog, StatusLogId, UserId};

/// Reason recorded on log rows produced by dispute changes.
pub const DISPUTE_UPDATE_REASON: &str = "dispute_update";

/// Builds the audit row for one mutating action on `order`.
pub(crate) fn status_log(
    order: &Order,
    actor_id: UserId,
    from_status: OrderStatus,
    reason: Option<&str>,
    category: Option<&str>,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> OrderStatusLog {
    OrderStatusLog {
        id: StatusLogId::new(),
        order_id: order.id,
        actor_id,
        from_status,
        to_status: order.status,
        reason: reason.unwrap_or_default().to_string(),
        category: category.unwrap_or_default().to_string(),
        note: note.unwrap_or_default().to_string(),
        created_at: now,
    }
}
