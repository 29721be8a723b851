//! Outbound notification seam.
//!
//! Services publish an [`OrderNotification`] after their unit of work has
//! committed. Delivery is best effort: failures are logged and never undo
//! or fail the operation that produced them.

use async_trait::async_trait;
use common::{DisputeStatus, OrderId, OrderStatus, UserId};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

/// Something an external notifier may want to tell the parties of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderNotification {
    OrderPlaced {
        order_id: OrderId,
        buyer_id: UserId,
        farmer_id: UserId,
    },
    StatusChanged {
        order_id: OrderId,
        actor_id: UserId,
        from: OrderStatus,
        to: OrderStatus,
    },
    DisputeUpdated {
        order_id: OrderId,
        farmer_id: UserId,
        status: DisputeStatus,
    },
}

impl OrderNotification {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderNotification::OrderPlaced { order_id, .. }
            | OrderNotification::StatusChanged { order_id, .. }
            | OrderNotification::DisputeUpdated { order_id, .. } => *order_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed")]
    ChannelClosed,
}

/// Receives notifications for asynchronous delivery.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn notify(&self, notification: OrderNotification) -> Result<(), NotifyError>;
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl OrderNotifier for NoopNotifier {
    async fn notify(&self, _notification: OrderNotification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Forwards notifications to a tokio channel drained by a delivery task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<OrderNotification>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OrderNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl OrderNotifier for ChannelNotifier {
    async fn notify(&self, notification: OrderNotification) -> Result<(), NotifyError> {
        self.sender
            .send(notification)
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

/// Hands `notification` to `notifier`, logging rather than returning failures.
pub async fn dispatch(notifier: &dyn OrderNotifier, notification: OrderNotification) {
    let order_id = notification.order_id();
    if let Err(e) = notifier.notify(notification).await {
        tracing::warn!(%order_id, error = %e, "order notification dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        let order_id = OrderId::new();

        dispatch(
            &notifier,
            OrderNotification::OrderPlaced {
                order_id,
                buyer_id: UserId::new(),
                farmer_id: UserId::new(),
            },
        )
        .await;
        dispatch(
            &notifier,
            OrderNotification::StatusChanged {
                order_id,
                actor_id: UserId::new(),
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
            },
        )
        .await;

        assert!(matches!(rx.recv().await, Some(OrderNotification::OrderPlaced { .. })));
        assert!(matches!(
            rx.recv().await,
            Some(OrderNotification::StatusChanged { to: OrderStatus::Confirmed, .. })
        ));
    }

    #[tokio::test]
    async fn closed_channel_is_not_fatal() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);

        let result = notifier
            .notify(OrderNotification::DisputeUpdated {
                order_id: OrderId::new(),
                farmer_id: UserId::new(),
                status: DisputeStatus::Open,
            })
            .await;
        assert!(matches!(result, Err(NotifyError::ChannelClosed)));

        // dispatch swallows the error
        dispatch(
            &notifier,
            OrderNotification::DisputeUpdated {
                order_id: OrderId::new(),
                farmer_id: UserId::new(),
                status: DisputeStatus::Open,
            },
        )
        .await;
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(OrderNotification::DisputeUpdated {
            order_id: OrderId::new(),
            farmer_id: UserId::new(),
            status: DisputeStatus::Resolved,
        })
        .unwrap();
        assert_eq!(json["type"], "dispute_updated");
        assert_eq!(json["status"], "resolved");
    }
}
