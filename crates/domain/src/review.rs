//! Buyer reviews of completed orders.

use chrono::Utc;
use common::{OrderId, OrderStatus, Review, ReviewId, UserId};
use serde::Deserialize;
use store::{MarketStore, StoreError, UnitOfWork};

use crate::error::{DomainError, Result};
use crate::validation::sanitize;

/// Command to rate the farmer of a completed order.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReview {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

impl SubmitReview {
    pub fn new(rating: u8, comment: impl Into<String>) -> Self {
        Self {
            rating,
            comment: comment.into(),
        }
    }
}

pub struct ReviewService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records the buyer's single review of a completed order.
    #[tracing::instrument(skip(self))]
    pub async fn submit_review(
        &self,
        order_id: OrderId,
        buyer_id: UserId,
        cmd: SubmitReview,
    ) -> Result<Review> {
        if !(1..=5).contains(&cmd.rating) {
            return Err(DomainError::validation("rating must be between 1 and 5"));
        }

        let mut tx = self.store.begin().await?;
        let order = tx
            .lock_order(order_id)
            .await?
            .ok_or(DomainError::NotFound("order"))?;
        if !order.is_buyer(buyer_id) {
            return Err(DomainError::Unauthorized("you can only review your own orders"));
        }
        if order.status != OrderStatus::Completed {
            return Err(DomainError::ReviewRequiresCompletedOrder);
        }
        if self.store.find_review(order_id, buyer_id).await?.is_some() {
            return Err(DomainError::ReviewAlreadySubmitted);
        }

        let review = Review {
            id: ReviewId::new(),
            order_id,
            reviewer_id: buyer_id,
            reviewee_id: order.farmer_id,
            rating: cmd.rating,
            comment: sanitize(&cmd.comment),
            created_at: Utc::now(),
        };
        tx.insert_review(&review).await.map_err(|e| match e {
            StoreError::UniqueViolation { .. } => DomainError::ReviewAlreadySubmitted,
            other => DomainError::Store(other),
        })?;
        tx.commit().await?;

        metrics::counter!("reviews_submitted_total").increment(1);
        tracing::info!(%order_id, rating = review.rating, "review submitted");
        Ok(review)
    }
}
