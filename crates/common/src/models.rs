//! Record types shared by the store, domain and reporting layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    CancellationType, CartItemId, DeliverySlot, DisputeStatus, Money, OrderId, OrderStatus,
    PriceHistoryId, ProductId, ProductStatus, Quantity, ReviewId, StatusLogId, UserId, UserRole,
};

/// A marketplace account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub city: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

/// A produce listing owned by a farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub farmer_id: UserId,
    pub crop_name: String,
    pub category: String,
    pub quantity: Quantity,
    pub unit: String,
    pub price_per_unit: Money,
    pub description: String,
    pub city: String,
    pub state: String,
    pub image_url: String,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.farmer_id == user
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active && !self.is_deleted()
    }
}

/// A purchase of one product by one buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub farmer_id: UserId,
    pub quantity: Quantity,
    pub total_price: Money,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub delivery_date: Option<DateTime<Utc>>,
    pub delivery_slot: Option<DeliverySlot>,
    pub cancellation_reason: Option<String>,
    pub cancellation_type: Option<CancellationType>,
    pub cancellation_note: Option<String>,
    pub dispute_status: DisputeStatus,
    pub dispute_note: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub packed_at: Option<DateTime<Utc>>,
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// True when `user` is the buyer or the farmer of this order.
    pub fn is_party(&self, user: UserId) -> bool {
        self.buyer_id == user || self.farmer_id == user
    }

    pub fn is_farmer(&self, user: UserId) -> bool {
        self.farmer_id == user
    }

    pub fn is_buyer(&self, user: UserId) -> bool {
        self.buyer_id == user
    }

    pub fn has_dispute(&self) -> bool {
        self.dispute_status != DisputeStatus::None
    }

    /// Stamps the timestamp column belonging to `status`.
    pub fn stamp(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        match status {
            OrderStatus::Confirmed => self.confirmed_at = Some(at),
            OrderStatus::Packed => self.packed_at = Some(at),
            OrderStatus::OutForDelivery => self.out_for_delivery_at = Some(at),
            OrderStatus::Completed => self.completed_at = Some(at),
            OrderStatus::Cancelled => self.cancelled_at = Some(at),
            OrderStatus::Pending => {}
        }
    }
}

/// One audit row per mutating action on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusLog {
    pub id: StatusLogId,
    pub order_id: OrderId,
    pub actor_id: UserId,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub reason: String,
    pub category: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// A buyer's rating of a farmer for a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub order_id: OrderId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub buyer_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPriceHistory {
    pub id: PriceHistoryId,
    pub product_id: ProductId,
    pub farmer_id: UserId,
    pub old_price: Money,
    pub new_price: Money,
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(buyer: UserId, farmer: UserId) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(),
            product_id: ProductId::new(),
            buyer_id: buyer,
            farmer_id: farmer,
            quantity: Quantity::from(2),
            total_price: Money::from(80),
            status: OrderStatus::Pending,
            delivery_address: String::new(),
            delivery_date: None,
            delivery_slot: None,
            cancellation_reason: None,
            cancellation_type: None,
            cancellation_note: None,
            dispute_status: DisputeStatus::None,
            dispute_note: None,
            confirmed_at: None,
            packed_at: None,
            out_for_delivery_at: None,
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn party_predicates() {
        let buyer = UserId::new();
        let farmer = UserId::new();
        let o = order(buyer, farmer);

        assert!(o.is_party(buyer));
        assert!(o.is_party(farmer));
        assert!(!o.is_party(UserId::new()));
        assert!(o.is_farmer(farmer));
        assert!(!o.is_farmer(buyer));
        assert!(o.is_buyer(buyer));
    }

    #[test]
    fn stamp_sets_matching_column() {
        let mut o = order(UserId::new(), UserId::new());
        let at = Utc::now();

        o.stamp(OrderStatus::Packed, at);
        assert_eq!(o.packed_at, Some(at));
        assert!(o.confirmed_at.is_none());

        o.stamp(OrderStatus::Cancelled, at);
        assert_eq!(o.cancelled_at, Some(at));
    }

    #[test]
    fn order_serializes_enums_as_strings() {
        let o = order(UserId::new(), UserId::new());
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["dispute_status"], "none");
    }
}
