//! The buyer's cart.
//!
//! Items are unique per (buyer, product); adding a product already in the
//! cart merges the quantities.

use std::collections::HashMap;

use chrono::Utc;
use common::{CartItem, CartItemId, Product, ProductId, Quantity, UserId};
use domain::validation::check_quantity;
use domain::{DomainError, Result};
use serde::{Deserialize, Serialize};
use store::{MarketStore, UnitOfWork};

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl AddToCart {
    pub fn new(product_id: ProductId, quantity: impl Into<Quantity>) -> Self {
        Self {
            product_id,
            quantity: quantity.into(),
        }
    }
}

/// A cart item with its product resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Option<Product>,
}

pub struct CartService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The buyer's cart, most recently updated first.
    #[tracing::instrument(skip(self))]
    pub async fn cart(&self, buyer_id: UserId) -> Result<Vec<CartLine>> {
        let items = self.store.list_cart_items(buyer_id).await?;
        let mut products: HashMap<ProductId, Option<Product>> = HashMap::new();
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            if !products.contains_key(&item.product_id) {
                let product = self.store.get_product(item.product_id).await?;
                products.insert(item.product_id, product);
            }
            lines.push(CartLine {
                product: products.get(&item.product_id).cloned().flatten(),
                item,
            });
        }
        Ok(lines)
    }

    /// Adds a product, merging with an existing line for the same product.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(&self, buyer_id: UserId, cmd: AddToCart) -> Result<CartItem> {
        check_quantity(cmd.quantity)?;

        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let product = tx
            .lock_product(cmd.product_id)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or(DomainError::NotFound("product"))?;
        if !product.is_available() {
            return Err(DomainError::ProductUnavailable(product.id));
        }
        if product.is_owned_by(buyer_id) {
            return Err(DomainError::OwnProduct);
        }

        let item = match tx.cart_item(buyer_id, product.id).await? {
            Some(mut existing) => {
                existing.quantity += cmd.quantity;
                existing.updated_at = now;
                existing
            }
            None => CartItem {
                id: CartItemId::new(),
                buyer_id,
                product_id: product.id,
                quantity: cmd.quantity,
                created_at: now,
                updated_at: now,
            },
        };
        if item.quantity > product.quantity {
            return Err(DomainError::CartExceedsStock);
        }

        tx.save_cart_item(&item).await?;
        tx.commit().await?;

        tracing::info!(cart_item_id = %item.id, quantity = %item.quantity, "cart item saved");
        Ok(item)
    }

    /// Replaces the quantity of one of the buyer's cart items.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        buyer_id: UserId,
        item_id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem> {
        check_quantity(quantity)?;

        let mut tx = self.store.begin().await?;
        let mut item = find_item(&mut tx, buyer_id, item_id).await?;
        let product = tx
            .lock_product(item.product_id)
            .await?
            .ok_or(DomainError::NotFound("product"))?;
        if !product.is_available() {
            return Err(DomainError::ProductUnavailable(product.id));
        }
        if quantity > product.quantity {
            return Err(DomainError::CartExceedsStock);
        }

        item.quantity = quantity;
        item.updated_at = Utc::now();
        tx.save_cart_item(&item).await?;
        tx.commit().await?;
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, buyer_id: UserId, item_id: CartItemId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let item = find_item(&mut tx, buyer_id, item_id).await?;
        if !tx.delete_cart_item(item.id).await? {
            return Err(DomainError::NotFound("cart item"));
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Finds a cart item that belongs to `buyer_id`.
async fn find_item<T: UnitOfWork>(
    tx: &mut T,
    buyer_id: UserId,
    item_id: CartItemId,
) -> Result<CartItem> {
    tx.cart_items(buyer_id)
        .await?
        .into_iter()
        .find(|i| i.id == item_id)
        .ok_or(DomainError::NotFound("cart item"))
}

#[cfg(test)]
mod tests {
    use common::{Money, ProductStatus};
    use store::InMemoryStore;

    use super::*;

    fn product(farmer_id: UserId, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            farmer_id,
            crop_name: "Okra".to_string(),
            category: "vegetables".to_string(),
            quantity: Quantity::from(quantity),
            unit: "kg".to_string(),
            price_per_unit: Money::from(30),
            description: String::new(),
            city: String::new(),
            state: String::new(),
            image_url: String::new(),
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    async fn seeded(p: &Product) -> CartService<InMemoryStore> {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_product(p).await.unwrap();
        tx.commit().await.unwrap();
        CartService::new(store)
    }

    #[tokio::test]
    async fn adding_twice_merges_and_respects_stock() {
        let p = product(UserId::new(), 5);
        let carts = seeded(&p).await;
        let buyer = UserId::new();

        let first = carts.add_to_cart(buyer, AddToCart::new(p.id, 2)).await.unwrap();
        let merged = carts.add_to_cart(buyer, AddToCart::new(p.id, 3)).await.unwrap();
        assert_eq!(merged.id, first.id);
        assert_eq!(merged.quantity, Quantity::from(5));

        let err = carts.add_to_cart(buyer, AddToCart::new(p.id, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::CartExceedsStock));

        let lines = carts.cart(buyer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.quantity, Quantity::from(5));
        assert_eq!(lines[0].product.as_ref().map(|p| p.id), Some(p.id));
    }

    #[tokio::test]
    async fn own_and_missing_products_are_rejected() {
        let farmer = UserId::new();
        let p = product(farmer, 5);
        let carts = seeded(&p).await;

        let err = carts.add_to_cart(farmer, AddToCart::new(p.id, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::OwnProduct));

        let err = carts
            .add_to_cart(UserId::new(), AddToCart::new(ProductId::new(), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound("product")));

        let err = carts
            .add_to_cart(UserId::new(), AddToCart::new(p.id, 0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quantity must be greater than 0");
    }

    #[tokio::test]
    async fn items_are_private_to_their_buyer() {
        let p = product(UserId::new(), 5);
        let carts = seeded(&p).await;
        let buyer = UserId::new();
        let item = carts.add_to_cart(buyer, AddToCart::new(p.id, 2)).await.unwrap();

        let other = UserId::new();
        let err = carts
            .update_quantity(other, item.id, Quantity::from(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound("cart item")));
        let err = carts.remove_item(other, item.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound("cart item")));

        let err = carts
            .update_quantity(buyer, item.id, Quantity::from(6))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CartExceedsStock));

        let updated = carts
            .update_quantity(buyer, item.id, Quantity::from(4))
            .await
            .unwrap();
        assert_eq!(updated.quantity, Quantity::from(4));

        carts.remove_item(buyer, item.id).await.unwrap();
        assert!(carts.cart(buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quantities_must_fit_storage() {
        use rust_decimal::Decimal;

        let p = product(UserId::new(), 5);
        let carts = seeded(&p).await;
        let buyer = UserId::new();

        let err = carts
            .add_to_cart(buyer, AddToCart::new(p.id, Decimal::new(4, 4)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quantity cannot have more than 3 decimal places");

        let item = carts
            .add_to_cart(buyer, AddToCart::new(p.id, Decimal::new(1250, 3)))
            .await
            .unwrap();
        let err = carts
            .update_quantity(buyer, item.id, Quantity::from(Quantity::MAX_UNITS + 1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "quantity cannot exceed 1000000");
        assert_eq!(
            carts.cart(buyer).await.unwrap()[0].item.quantity,
            Quantity::new(Decimal::new(1250, 3))
        );
    }
}
