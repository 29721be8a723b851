//! Order service: direct purchase, the status state machine and order reads.

use std::sync::Arc;

use chrono::Utc;
use common::{
    CancellationType, DeliverySlot, DisputeStatus, Order, OrderId, OrderStatus, OrderStatusLog,
    UserId,
};
use store::{MarketStore, UnitOfWork};

use crate::error::{DomainError, Result};
use crate::notifier::{NoopNotifier, OrderNotification, OrderNotifier, dispatch};
use crate::validation::{check_quantity, non_blank, parse_delivery_date, parse_optional};

use super::audit::{DISPUTE_UPDATE_REASON, status_log};
use super::details::{OrderDetails, hydrate, hydrate_one};
use super::inventory;
use super::{CreateOrder, UpdateOrderStatus};

/// Reason and note recorded when a party cancels through [`OrderService::cancel_order`].
pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelled by user";

/// Fully validated form of an [`UpdateOrderStatus`] request.
#[derive(Debug)]
struct ValidatedUpdate {
    target: OrderStatus,
    cancellation: Option<(CancellationType, String, Option<String>)>,
    delivery_slot: Option<DeliverySlot>,
    delivery_date: Option<chrono::DateTime<Utc>>,
    dispute_status: Option<DisputeStatus>,
    dispute_note: Option<String>,
}

/// Service for managing orders.
///
/// Every mutation runs in one unit of work that locks the order (and the
/// product, when stock moves) and appends exactly one status log row.
pub struct OrderService<S: MarketStore> {
    store: S,
    notifier: Arc<dyn OrderNotifier>,
}

impl<S: MarketStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            notifier: Arc::new(NoopNotifier),
        }
    }

    /// Replaces the notifier that receives post-commit order notifications.
    pub fn with_notifier(mut self, notifier: Arc<dyn OrderNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Buys `cmd.quantity` of a product directly, reserving stock atomically.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, buyer_id: UserId, cmd: CreateOrder) -> Result<OrderDetails> {
        check_quantity(cmd.quantity)?;

        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let (order, product) = inventory::reserve(
            &mut tx,
            cmd.product_id,
            buyer_id,
            cmd.quantity,
            &cmd.delivery_address,
            now,
        )
        .await?;
        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            product_id = %product.id,
            remaining = %product.quantity,
            "order created"
        );
        dispatch(
            self.notifier.as_ref(),
            OrderNotification::OrderPlaced {
                order_id: order.id,
                buyer_id,
                farmer_id: order.farmer_id,
            },
        )
        .await;

        hydrate_one(&self.store, order).await
    }

    /// Loads an order the actor is a party to.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId, actor_id: UserId) -> Result<OrderDetails> {
        let order = self.load(order_id).await?;
        if !order.is_party(actor_id) {
            return Err(DomainError::Unauthorized("you can only view your own orders"));
        }
        hydrate_one(&self.store, order).await
    }

    /// Orders placed by a buyer, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_buyer(&self, buyer_id: UserId) -> Result<Vec<OrderDetails>> {
        let orders = self.store.list_orders_by_buyer(buyer_id).await?;
        hydrate(&self.store, orders).await
    }

    /// Orders received by a farmer, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_farmer(&self, farmer_id: UserId) -> Result<Vec<OrderDetails>> {
        let orders = self.store.list_orders_by_farmer(farmer_id).await?;
        hydrate(&self.store, orders).await
    }

    /// The order's audit trail, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn status_history(
        &self,
        order_id: OrderId,
        actor_id: UserId,
    ) -> Result<Vec<OrderStatusLog>> {
        let order = self.load(order_id).await?;
        if !order.is_party(actor_id) {
            return Err(DomainError::Unauthorized(
                "you can only access your own order history",
            ));
        }
        Ok(self.store.list_status_logs(order_id).await?)
    }

    /// Applies a status transition and/or detail update to an order.
    ///
    /// A request whose status equals the current one only updates details.
    /// Moving into `cancelled` returns the order's quantity to stock.
    #[tracing::instrument(skip(self, req), fields(status = %req.status))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        actor_id: UserId,
        req: UpdateOrderStatus,
    ) -> Result<OrderDetails> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or(DomainError::NotFound("order"))?;
        if !order.is_party(actor_id) {
            return Err(DomainError::Unauthorized("you can only update your own orders"));
        }

        let update = validate_update(&order, actor_id, &req, now)?;

        let from = order.status;
        let status_changed = from != update.target;
        if status_changed {
            order.status = update.target;
            order.stamp(update.target, now);
        }
        if let Some((kind, ref reason, ref note)) = update.cancellation {
            order.cancellation_type = Some(kind);
            order.cancellation_reason = Some(reason.clone());
            order.cancellation_note = note.clone();
        }
        if let Some(slot) = update.delivery_slot {
            order.delivery_slot = Some(slot);
        }
        if let Some(date) = update.delivery_date {
            order.delivery_date = Some(date);
        }
        let dispute_before = order.dispute_status;
        if let Some(dispute) = update.dispute_status {
            order.dispute_status = dispute;
        }
        if let Some(ref note) = update.dispute_note {
            order.dispute_note = Some(note.clone());
        }
        order.updated_at = now;

        if status_changed && order.status == OrderStatus::Cancelled {
            inventory::release(&mut tx, &order, now).await?;
        }
        tx.update_order(&order).await?;

        let log = match update.dispute_status {
            Some(dispute) => status_log(
                &order,
                actor_id,
                from,
                Some(DISPUTE_UPDATE_REASON),
                Some(dispute.as_str()),
                update.dispute_note.as_deref(),
                now,
            ),
            None => status_log(
                &order,
                actor_id,
                from,
                update.cancellation.as_ref().map(|(_, reason, _)| reason.as_str()),
                update.cancellation.as_ref().map(|(kind, _, _)| kind.as_str()),
                update.cancellation.as_ref().and_then(|(_, _, note)| note.as_deref()),
                now,
            ),
        };
        tx.append_status_log(&log).await?;
        tx.commit().await?;

        metrics::counter!("order_transitions_total", "to" => order.status.as_str()).increment(1);
        tracing::info!(%order_id, %from, to = %order.status, "order updated");

        if status_changed {
            dispatch(
                self.notifier.as_ref(),
                OrderNotification::StatusChanged {
                    order_id,
                    actor_id,
                    from,
                    to: order.status,
                },
            )
            .await;
        }
        if order.dispute_status != dispute_before {
            metrics::counter!("disputes_total", "status" => order.dispute_status.as_str())
                .increment(1);
            dispatch(
                self.notifier.as_ref(),
                OrderNotification::DisputeUpdated {
                    order_id,
                    farmer_id: order.farmer_id,
                    status: order.dispute_status,
                },
            )
            .await;
        }

        hydrate_one(&self.store, order).await
    }

    /// Cancels an order on behalf of either party with a generic reason.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId, actor_id: UserId) -> Result<OrderDetails> {
        let order = self.load(order_id).await?;
        if !order.is_party(actor_id) {
            return Err(DomainError::Unauthorized("you can only cancel your own orders"));
        }
        if order.status == OrderStatus::Completed {
            return Err(DomainError::CannotCancelCompleted);
        }

        let req = UpdateOrderStatus::to(OrderStatus::Cancelled.as_str())
            .with_cancellation(CancellationType::Other.as_str(), DEFAULT_CANCELLATION_REASON)
            .with_cancellation_note(DEFAULT_CANCELLATION_REASON);
        self.transition(order_id, actor_id, req).await
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::NotFound("order"))
    }
}

/// Checks every field of `req` against `order` before anything is written.
fn validate_update(
    order: &Order,
    actor_id: UserId,
    req: &UpdateOrderStatus,
    now: chrono::DateTime<Utc>,
) -> Result<ValidatedUpdate> {
    let raw_status = req.status.trim();
    if raw_status.is_empty() {
        return Err(DomainError::validation("status is required"));
    }
    let cancellation_type: Option<CancellationType> =
        parse_optional(req.cancellation_type.as_deref(), "invalid cancellation type")?;
    let delivery_slot: Option<DeliverySlot> =
        parse_optional(req.delivery_slot.as_deref(), "invalid delivery slot")?;
    let dispute_status: Option<DisputeStatus> =
        parse_optional(req.dispute_status.as_deref(), "invalid dispute status")?;
    let target: OrderStatus = raw_status
        .parse()
        .map_err(|_| DomainError::validation("invalid order status"))?;

    if target != order.status && !order.status.can_transition_to(target) {
        return Err(DomainError::InvalidTransition {
            from: order.status,
            to: target,
        });
    }

    let cancellation = if target == OrderStatus::Cancelled {
        let kind =
            cancellation_type.ok_or_else(|| DomainError::validation("cancellation type is required"))?;
        let reason = non_blank(req.cancellation_reason.as_deref())
            .ok_or_else(|| DomainError::validation("cancellation reason is required"))?;
        Some((kind, reason, non_blank(req.cancellation_note.as_deref())))
    } else {
        None
    };

    let delivery_date = match non_blank(req.delivery_date.as_deref()) {
        Some(raw) => Some(parse_delivery_date(&raw, now)?),
        None => None,
    };

    let dispute_note = non_blank(req.dispute_note.as_deref());
    if (dispute_status.is_some() || dispute_note.is_some()) && !order.is_farmer(actor_id) {
        return Err(DomainError::Unauthorized(
            "only the farmer can update an order's dispute",
        ));
    }
    if let Some(next) = dispute_status
        && next != order.dispute_status
    {
        check_dispute_step(order.dispute_status, next, target)?;
    }

    Ok(ValidatedUpdate {
        target,
        cancellation,
        delivery_slot,
        delivery_date,
        dispute_status,
        dispute_note,
    })
}

/// Validates one step of the dispute graph for an order ending in `order_status`.
pub(crate) fn check_dispute_step(
    current: DisputeStatus,
    next: DisputeStatus,
    order_status: OrderStatus,
) -> Result<()> {
    match next {
        DisputeStatus::Open => {
            if current != DisputeStatus::None {
                return Err(DomainError::DisputeAlreadyExists);
            }
            if order_status != OrderStatus::Completed {
                return Err(DomainError::DisputeRequiresCompletedOrder);
            }
        }
        DisputeStatus::Resolved | DisputeStatus::Rejected => {
            if current != DisputeStatus::Open {
                return Err(DomainError::DisputeNotOpen);
            }
        }
        DisputeStatus::None => {
            return Err(DomainError::validation("invalid dispute status"));
        }
    }
    debug_assert!(current.can_transition_to(next));
    Ok(())
}
