//! Pure projections over committed orders, products and reviews.
//!
//! Every function here takes already-loaded rows and an explicit `now`, and
//! has no side effects.

pub mod analytics;
pub mod listings;
pub mod notifications;
pub mod payout;
pub mod period;
pub mod report;

pub use analytics::{AnalyticsSummary, TopProduct, analytics};
pub use listings::{BuyerReviewItem, DisputeItem, FarmerReviewItem, dispute_items};
pub use notifications::{
    MAX_NOTIFICATIONS, Notification, NotificationKind, Priority, buyer_notifications,
    farmer_notifications,
};
pub use payout::{CURRENCY, Invoice, PayoutSummary, fee_rate, invoice, payout_summary, split_gross};
pub use period::{Period, PeriodSummary, period_summary};
pub use report::{ReportType, render_csv, report_filename};

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{Duration, Utc};
    use common::{
        DisputeStatus, Money, Order, OrderId, OrderStatus, Product, ProductId, ProductStatus,
        Quantity, User, UserId, UserRole,
    };
    use domain::OrderDetails;

    pub fn order(status: OrderStatus, quantity: i64, total: i64) -> Order {
        let now = Utc::now();
        let mut order = Order {
            id: OrderId::new(),
            product_id: ProductId::new(),
            buyer_id: UserId::new(),
            farmer_id: UserId::new(),
            quantity: Quantity::from(quantity),
            total_price: Money::from(total),
            status,
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
        };
        order.stamp(status, now);
        order
    }

    pub fn aged(mut order: Order, hours: i64) -> Order {
        order.created_at -= Duration::hours(hours);
        order.updated_at = order.created_at;
        order
    }

    pub fn product(name: &str, quantity: i64, status: ProductStatus) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            farmer_id: UserId::new(),
            crop_name: name.to_string(),
            category: "vegetables".to_string(),
            quantity: Quantity::from(quantity),
            unit: "kg".to_string(),
            price_per_unit: Money::from(10),
            description: String::new(),
            city: String::new(),
            state: String::new(),
            image_url: String::new(),
            status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn user(name: &str, role: UserRole) -> User {
        User {
            id: UserId::new(),
            name: name.to_string(),
            email: format!("{}@example.in", name.to_lowercase()),
            phone: None,
            role,
            city: String::new(),
            state: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Wraps `order` with a product of the given name and a buyer named "Asha".
    pub fn details(mut order: Order, product_name: &str) -> OrderDetails {
        let product = product(product_name, 10, ProductStatus::Active);
        let buyer = user("Asha", UserRole::Buyer);
        order.product_id = product.id;
        order.buyer_id = buyer.id;
        OrderDetails {
            order,
            product: Some(product),
            buyer: Some(buyer),
            farmer: None,
        }
    }
}
