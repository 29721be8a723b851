//! Stock reservation and release.
//!
//! These run inside a caller-owned [`UnitOfWork`] so that the product row
//! stays locked from validation until commit. Every order-creating path,
//! direct or through the cart, goes through [`lock_reservable`] and
//! [`place_order`].

use chrono::{DateTime, Utc};
use common::{
    DisputeStatus, Order, OrderId, OrderStatus, Product, ProductId, ProductStatus, Quantity,
    UserId,
};
use store::UnitOfWork;

use crate::error::{DomainError, Result};

/// Locks `product_id` and checks that `buyer_id` may order `quantity` of it.
pub async fn lock_reservable<T: UnitOfWork>(
    tx: &mut T,
    product_id: ProductId,
    buyer_id: UserId,
    quantity: Quantity,
) -> Result<Product> {
    let product = tx
        .lock_product(product_id)
        .await?
        .ok_or(DomainError::NotFound("product"))?;

    if !product.is_available() {
        return Err(DomainError::ProductUnavailable(product_id));
    }
    if product.quantity < quantity {
        return Err(DomainError::InsufficientStock {
            product_id,
            available: product.quantity,
            requested: quantity,
        });
    }
    if product.is_owned_by(buyer_id) {
        return Err(DomainError::OwnProduct);
    }
    Ok(product)
}

/// Creates a pending order against a locked product and decrements its stock.
///
/// The total price is frozen at the current unit price, rounded to paise.
/// A product whose stock reaches zero is marked sold.
pub async fn place_order<T: UnitOfWork>(
    tx: &mut T,
    product: &mut Product,
    buyer_id: UserId,
    quantity: Quantity,
    delivery_address: &str,
    now: DateTime<Utc>,
) -> Result<Order> {
    let total_price = product
        .price_per_unit
        .checked_times(quantity)
        .ok_or_else(|| DomainError::validation("order total is too large"))?;
    let order = Order {
        id: OrderId::new(),
        product_id: product.id,
        buyer_id,
        farmer_id: product.farmer_id,
        quantity,
        total_price,
        status: OrderStatus::Pending,
        delivery_address: delivery_address.trim().to_string(),
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
    tx.insert_order(&order).await?;

    product.quantity = product.quantity - quantity;
    if !product.quantity.is_positive() {
        product.quantity = Quantity::ZERO;
        product.status = ProductStatus::Sold;
    }
    product.updated_at = now;
    tx.update_product(product).await?;

    Ok(order)
}

/// Lock, validate and place in one call.
pub async fn reserve<T: UnitOfWork>(
    tx: &mut T,
    product_id: ProductId,
    buyer_id: UserId,
    quantity: Quantity,
    delivery_address: &str,
    now: DateTime<Utc>,
) -> Result<(Order, Product)> {
    let mut product = lock_reservable(tx, product_id, buyer_id, quantity).await?;
    let order = place_order(tx, &mut product, buyer_id, quantity, delivery_address, now).await?;
    Ok((order, product))
}

/// Returns a cancelled order's quantity to stock.
///
/// Any product left with stock becomes active again, whatever its status
/// was. A product row that no longer exists is skipped.
pub async fn release<T: UnitOfWork>(
    tx: &mut T,
    order: &Order,
    now: DateTime<Utc>,
) -> Result<Option<Product>> {
    let Some(mut product) = tx.lock_product(order.product_id).await? else {
        tracing::warn!(order_id = %order.id, product_id = %order.product_id, "released order has no product row");
        return Ok(None);
    };

    product.quantity += order.quantity;
    if product.quantity.is_positive() {
        product.status = ProductStatus::Active;
    }
    product.updated_at = now;
    tx.update_product(&product).await?;

    Ok(Some(product))
}
