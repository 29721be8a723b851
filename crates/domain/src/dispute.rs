//! Farmer-raised disputes on completed orders.
//!
//! ```text
//! none ──► open ──┬──► resolved
//!                 └──► rejected
//! ```
//!
//! Dispute actions never change the order status; their log rows carry
//! `from_status == to_status`.

use std::sync::Arc;

use chrono::Utc;
use common::{DisputeStatus, OrderId, OrderStatus, UserId};
use store::{MarketStore, UnitOfWork};

use crate::error::{DomainError, Result};
use crate::notifier::{NoopNotifier, OrderNotification, OrderNotifier, dispatch};
use crate::order::{DISPUTE_UPDATE_REASON, OrderDetails, check_dispute_step, hydrate_one, status_log};
use crate::validation::sanitize;

/// Service for opening and closing disputes.
pub struct DisputeService<S: MarketStore> {
    store: S,
    notifier: Arc<dyn OrderNotifier>,
}

impl<S: MarketStore> DisputeService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            notifier: Arc::new(NoopNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OrderNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Opens a dispute on one of the farmer's completed orders.
    #[tracing::instrument(skip(self, note))]
    pub async fn open_dispute(
        &self,
        order_id: OrderId,
        farmer_id: UserId,
        note: &str,
    ) -> Result<OrderDetails> {
        self.apply(order_id, farmer_id, DisputeStatus::Open, sanitize(note))
            .await
    }

    #[tracing::instrument(skip(self, note))]
    pub async fn resolve_dispute(
        &self,
        order_id: OrderId,
        farmer_id: UserId,
        note: &str,
    ) -> Result<OrderDetails> {
        self.close(order_id, farmer_id, DisputeStatus::Resolved, note)
            .await
    }

    #[tracing::instrument(skip(self, note))]
    pub async fn reject_dispute(
        &self,
        order_id: OrderId,
        farmer_id: UserId,
        note: &str,
    ) -> Result<OrderDetails> {
        self.close(order_id, farmer_id, DisputeStatus::Rejected, note)
            .await
    }

    async fn close(
        &self,
        order_id: OrderId,
        farmer_id: UserId,
        target: DisputeStatus,
        note: &str,
    ) -> Result<OrderDetails> {
        let note = sanitize(note);
        if note.is_empty() {
            return Err(DomainError::validation("resolution reason is required"));
        }
        self.apply(order_id, farmer_id, target, note).await
    }

    async fn apply(
        &self,
        order_id: OrderId,
        farmer_id: UserId,
        target: DisputeStatus,
        note: String,
    ) -> Result<OrderDetails> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or(DomainError::NotFound("order"))?;
        if !order.is_farmer(farmer_id) {
            return Err(DomainError::Unauthorized("you can only update your own orders"));
        }
        if target == DisputeStatus::Open && order.status != OrderStatus::Completed {
            return Err(DomainError::DisputeRequiresCompletedOrder);
        }
        check_dispute_step(order.dispute_status, target, order.status)?;

        let from = order.status;
        order.dispute_status = target;
        order.dispute_note = Some(note.clone());
        order.updated_at = now;
        tx.update_order(&order).await?;

        let log = status_log(
            &order,
            farmer_id,
            from,
            Some(DISPUTE_UPDATE_REASON),
            Some(target.as_str()),
            Some(note.as_str()),
            now,
        );
        tx.append_status_log(&log).await?;
        tx.commit().await?;

        metrics::counter!("disputes_total", "status" => target.as_str()).increment(1);
        tracing::info!(%order_id, dispute_status = %target, "dispute updated");
        dispatch(
            self.notifier.as_ref(),
            OrderNotification::DisputeUpdated {
                order_id,
                farmer_id,
                status: target,
            },
        )
        .await;

        hydrate_one(&self.store, order).await
    }
}
