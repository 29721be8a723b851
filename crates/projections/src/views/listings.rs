//! Review and dispute listings joined with their orders.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{DisputeStatus, OrderId, OrderStatus, Review, ReviewId};
use domain::OrderDetails;
use serde::Serialize;

/// A review a farmer received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmerReviewItem {
    pub review_id: ReviewId,
    pub order_id: OrderId,
    pub product_name: String,
    pub reviewer: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A review a buyer wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyerReviewItem {
    pub review_id: ReviewId,
    pub order_id: OrderId,
    pub product_name: String,
    pub farmer_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisputeItem {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub dispute_status: DisputeStatus,
    pub dispute_note: Option<String>,
    pub buyer_name: String,
    pub product_name: String,
    pub updated_at: DateTime<Utc>,
}

fn index(orders: &[OrderDetails]) -> HashMap<OrderId, &OrderDetails> {
    orders.iter().map(|d| (d.order.id, d)).collect()
}

fn crop_name(details: Option<&&OrderDetails>) -> String {
    details
        .and_then(|d| d.product.as_ref())
        .map(|p| p.crop_name.clone())
        .unwrap_or_default()
}

impl FarmerReviewItem {
    /// Joins each review with its order, newest review first.
    pub fn list(reviews: &[Review], orders: &[OrderDetails]) -> Vec<Self> {
        let by_id = index(orders);
        let mut items: Vec<_> = reviews
            .iter()
            .map(|review| {
                let details = by_id.get(&review.order_id);
                Self {
                    review_id: review.id,
                    order_id: review.order_id,
                    product_name: crop_name(details),
                    reviewer: details.map(|d| d.buyer_name().to_string()).unwrap_or_default(),
                    rating: review.rating,
                    comment: review.comment.clone(),
                    created_at: review.created_at,
                }
            })
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

impl BuyerReviewItem {
    /// Joins each review with its order, newest review first.
    pub fn list(reviews: &[Review], orders: &[OrderDetails]) -> Vec<Self> {
        let by_id = index(orders);
        let mut items: Vec<_> = reviews
            .iter()
            .map(|review| {
                let details = by_id.get(&review.order_id);
                Self {
                    review_id: review.id,
                    order_id: review.order_id,
                    product_name: crop_name(details),
                    farmer_name: details
                        .and_then(|d| d.farmer.as_ref())
                        .map(|u| u.name.clone())
                        .unwrap_or_default(),
                    rating: review.rating,
                    comment: review.comment.clone(),
                    created_at: review.created_at,
                }
            })
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

/// Orders that ever had a dispute, most recently updated first.
pub fn dispute_items(orders: &[OrderDetails]) -> Vec<DisputeItem> {
    let mut items: Vec<_> = orders
        .iter()
        .filter(|d| d.order.dispute_status != DisputeStatus::None)
        .map(|d| DisputeItem {
            order_id: d.order.id,
            order_status: d.order.status,
            dispute_status: d.order.dispute_status,
            dispute_note: d.order.dispute_note.clone(),
            buyer_name: d.buyer_name().to_string(),
            product_name: d.product.as_ref().map(|p| p.crop_name.clone()).unwrap_or_default(),
            updated_at: d.order.updated_at,
        })
        .collect();
    items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    items
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use common::{UserId, UserRole};

    use super::*;
    use crate::views::testing::{details, order, user};

    fn review(order_id: OrderId, rating: u8, age_hours: i64) -> Review {
        Review {
            id: ReviewId::new(),
            order_id,
            reviewer_id: UserId::new(),
            reviewee_id: UserId::new(),
            rating,
            comment: format!("{rating} stars"),
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[test]
    fn farmer_reviews_name_the_buyer_and_crop() {
        let row = details(order(OrderStatus::Completed, 1, 10), "Guava");
        let older = review(row.order.id, 3, 5);
        let newer = review(row.order.id, 5, 1);

        let items = FarmerReviewItem::list(&[older, newer], &[row]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].rating, 5);
        assert_eq!(items[0].reviewer, "Asha");
        assert_eq!(items[0].product_name, "Guava");
    }

    #[test]
    fn buyer_reviews_name_the_farmer() {
        let mut row = details(order(OrderStatus::Completed, 1, 10), "Guava");
        row.farmer = Some(user("Ravi", UserRole::Farmer));
        let items = BuyerReviewItem::list(&[review(row.order.id, 4, 0)], &[row]);
        assert_eq!(items[0].farmer_name, "Ravi");
    }

    #[test]
    fn reviews_without_orders_keep_blank_names() {
        let items = FarmerReviewItem::list(&[review(OrderId::new(), 2, 0)], &[]);
        assert_eq!(items[0].reviewer, "");
        assert_eq!(items[0].product_name, "");
    }

    #[test]
    fn disputes_listed_most_recent_first() {
        let plain = details(order(OrderStatus::Completed, 1, 10), "Rice");
        let mut first = details(order(OrderStatus::Completed, 1, 10), "Rice");
        first.order.dispute_status = DisputeStatus::Resolved;
        first.order.updated_at -= Duration::hours(3);
        let mut second = details(order(OrderStatus::Completed, 1, 10), "Wheat");
        second.order.dispute_status = DisputeStatus::Open;
        second.order.dispute_note = Some("damaged".to_string());

        let items = dispute_items(&[plain, first.clone(), second.clone()]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].order_id, second.order.id);
        assert_eq!(items[0].dispute_note.as_deref(), Some("damaged"));
        assert_eq!(items[1].order_id, first.order.id);
    }
}
