//! Shared types for the farm marketplace.
//!
//! Every other crate in the workspace speaks in these types:
//! - strongly-typed identifiers, one per entity
//! - exact [`Quantity`] and [`Money`] values
//! - closed status enumerations, including the order transition graph
//! - the persisted records (products, orders, status logs, reviews, carts)

pub mod ids;
pub mod models;
pub mod status;
pub mod values;

pub use ids::{CartItemId, OrderId, PriceHistoryId, ProductId, ReviewId, StatusLogId, UserId};
pub use models::{
    CartItem, Order, OrderStatusLog, Product, ProductPriceHistory, Review, User,
};
pub use status::{
    CancellationType, DeliverySlot, DisputeStatus, OrderStatus, ParseEnumError, ProductStatus,
    UserRole,
};
pub use values::{Money, Quantity};
