//! Product listings owned by farmers.

use chrono::Utc;
use common::{
    Money, PriceHistoryId, Product, ProductId, ProductPriceHistory, ProductStatus, Quantity,
    UserId,
};
use serde::Deserialize;
use store::{MarketStore, ProductFilter, UnitOfWork};

use crate::error::{DomainError, Result};
use crate::validation::{check_quantity, check_stock_quantity, check_unit_price, sanitize};

/// Default and maximum result sizes for [`ProductService::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Listing fields supplied when creating or editing a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub crop_name: String,
    pub category: String,
    pub quantity: Quantity,
    pub unit: String,
    pub price_per_unit: Money,
    pub description: String,
    pub city: String,
    pub state: String,
    pub image_url: String,
}

impl ProductDraft {
    pub fn new(
        crop_name: impl Into<String>,
        category: impl Into<String>,
        quantity: impl Into<Quantity>,
        unit: impl Into<String>,
        price_per_unit: impl Into<Money>,
    ) -> Self {
        Self {
            crop_name: crop_name.into(),
            category: category.into(),
            quantity: quantity.into(),
            unit: unit.into(),
            price_per_unit: price_per_unit.into(),
            ..Self::default()
        }
    }

    fn check_text_fields(&self) -> Result<()> {
        if self.crop_name.trim().is_empty() {
            return Err(DomainError::validation("crop name is required"));
        }
        if self.unit.trim().is_empty() {
            return Err(DomainError::validation("unit is required"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category is required"));
        }
        Ok(())
    }
}

pub struct ProductService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists a new active product for `farmer_id`.
    #[tracing::instrument(skip(self))]
    pub async fn create_product(&self, farmer_id: UserId, draft: ProductDraft) -> Result<Product> {
        draft.check_text_fields()?;
        check_quantity(draft.quantity)?;
        check_unit_price(draft.price_per_unit)?;

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            farmer_id,
            crop_name: sanitize(&draft.crop_name),
            category: sanitize(&draft.category).to_lowercase(),
            quantity: draft.quantity,
            unit: sanitize(&draft.unit),
            price_per_unit: draft.price_per_unit,
            description: sanitize(&draft.description),
            city: sanitize(&draft.city),
            state: sanitize(&draft.state),
            image_url: draft.image_url.trim().to_string(),
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_product(&product).await?;
        tx.commit().await?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// A live (not deleted) product.
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product> {
        self.store
            .get_product(product_id)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or(DomainError::NotFound("product"))
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        Ok(self.store.list_products(filter).await?)
    }

    pub async fn products_for_farmer(&self, farmer_id: UserId) -> Result<Vec<Product>> {
        Ok(self.store.list_products_by_farmer(farmer_id).await?)
    }

    /// Active products whose crop name contains `query`, newest first.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        Ok(self
            .store
            .list_products(&ProductFilter::search(query, limit))
            .await?)
    }

    /// Replaces a product's listing fields.
    ///
    /// A quantity of zero marks the product sold; a sold product given stock
    /// becomes active. A price change appends a history row.
    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        farmer_id: UserId,
        draft: ProductDraft,
    ) -> Result<Product> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut product = lock_owned(&mut tx, product_id, farmer_id, "you can only update your own products").await?;

        check_stock_quantity(draft.quantity)?;
        check_unit_price(draft.price_per_unit)?;
        draft.check_text_fields()?;

        let old_price = product.price_per_unit;
        product.crop_name = sanitize(&draft.crop_name);
        product.category = sanitize(&draft.category).to_lowercase();
        product.quantity = draft.quantity;
        product.unit = sanitize(&draft.unit);
        product.price_per_unit = draft.price_per_unit;
        product.description = sanitize(&draft.description);
        product.city = sanitize(&draft.city);
        product.state = sanitize(&draft.state);
        if !draft.image_url.trim().is_empty() {
            product.image_url = draft.image_url.trim().to_string();
        }
        if !product.quantity.is_positive() {
            product.quantity = Quantity::ZERO;
            product.status = ProductStatus::Sold;
        } else if product.status == ProductStatus::Sold {
            product.status = ProductStatus::Active;
        }
        product.updated_at = now;
        tx.update_product(&product).await?;

        if old_price != product.price_per_unit {
            tx.append_price_history(&price_change(&product, old_price, now))
                .await?;
        }
        tx.commit().await?;

        tracing::info!(%product_id, "product updated");
        Ok(product)
    }

    /// Changes only the price, always appending a history row.
    #[tracing::instrument(skip(self))]
    pub async fn update_price(
        &self,
        product_id: ProductId,
        farmer_id: UserId,
        price_per_unit: Money,
    ) -> Result<Product> {
        check_unit_price(price_per_unit)?;

        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut product = lock_owned(&mut tx, product_id, farmer_id, "you can only update your own products").await?;

        let old_price = product.price_per_unit;
        product.price_per_unit = price_per_unit;
        product.updated_at = now;
        tx.update_product(&product).await?;
        tx.append_price_history(&price_change(&product, old_price, now))
            .await?;
        tx.commit().await?;

        tracing::info!(%product_id, old = %old_price, new = %price_per_unit, "price updated");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        product_id: ProductId,
        farmer_id: UserId,
        status: &str,
    ) -> Result<Product> {
        let next = parse_product_status(status)?;

        let mut tx = self.store.begin().await?;
        let mut product = lock_owned(&mut tx, product_id, farmer_id, "you can only update your own products").await?;
        if next == ProductStatus::Active && !product.quantity.is_positive() {
            return Err(DomainError::ProductStatusConflict(
                "cannot mark as active when quantity is 0",
            ));
        }
        if product.status == ProductStatus::Sold && next == ProductStatus::Draft {
            return Err(DomainError::ProductStatusConflict(
                "sold products cannot be moved to draft",
            ));
        }

        product.status = next;
        product.updated_at = Utc::now();
        tx.update_product(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Sets the status of several products, all or nothing.
    #[tracing::instrument(skip(self))]
    pub async fn bulk_update_status(
        &self,
        farmer_id: UserId,
        product_ids: &[ProductId],
        status: &str,
    ) -> Result<usize> {
        let next = parse_product_status(status)?;
        if product_ids.is_empty() {
            return Err(DomainError::validation("product ids are required"));
        }

        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut locked = Vec::with_capacity(product_ids.len());
        for id in product_ids {
            let product = tx
                .lock_product(*id)
                .await?
                .filter(|p| !p.is_deleted())
                .ok_or_else(|| DomainError::validation("one or more products not found"))?;
            if !product.is_owned_by(farmer_id) {
                return Err(DomainError::Unauthorized("you can only update your own products"));
            }
            if next == ProductStatus::Active && !product.quantity.is_positive() {
                return Err(DomainError::ProductStatusConflict(
                    "cannot mark out of stock products as active",
                ));
            }
            locked.push(product);
        }

        for product in &mut locked {
            product.status = next;
            product.updated_at = now;
            tx.update_product(product).await?;
        }
        tx.commit().await?;

        tracing::info!(count = locked.len(), status = %next, "products updated");
        Ok(locked.len())
    }

    /// Copies a product into a new draft listing.
    #[tracing::instrument(skip(self))]
    pub async fn duplicate(&self, product_id: ProductId, farmer_id: UserId) -> Result<Product> {
        let source = self.get_product(product_id).await?;
        if !source.is_owned_by(farmer_id) {
            return Err(DomainError::Unauthorized("you can only duplicate your own products"));
        }

        let now = Utc::now();
        let copy = Product {
            id: ProductId::new(),
            crop_name: format!("{} (Copy)", source.crop_name),
            status: ProductStatus::Draft,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            ..source
        };

        let mut tx = self.store.begin().await?;
        tx.insert_product(&copy).await?;
        tx.commit().await?;
        Ok(copy)
    }

    /// Soft-deletes a product. Orders keep referencing it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, product_id: ProductId, farmer_id: UserId) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut product = lock_owned(&mut tx, product_id, farmer_id, "you can only delete your own products").await?;
        product.deleted_at = Some(now);
        product.updated_at = now;
        tx.update_product(&product).await?;
        tx.commit().await?;

        tracing::info!(%product_id, "product deleted");
        Ok(())
    }

    /// Price changes of an owned product, newest first.
    pub async fn price_history(
        &self,
        product_id: ProductId,
        farmer_id: UserId,
    ) -> Result<Vec<ProductPriceHistory>> {
        let product = self.get_product(product_id).await?;
        if !product.is_owned_by(farmer_id) {
            return Err(DomainError::Unauthorized("you can only access your own products"));
        }
        Ok(self.store.list_price_history(product_id).await?)
    }
}

async fn lock_owned<T: UnitOfWork>(
    tx: &mut T,
    product_id: ProductId,
    farmer_id: UserId,
    denied: &'static str,
) -> Result<Product> {
    let product = tx
        .lock_product(product_id)
        .await?
        .filter(|p| !p.is_deleted())
        .ok_or(DomainError::NotFound("product"))?;
    if !product.is_owned_by(farmer_id) {
        return Err(DomainError::Unauthorized(denied));
    }
    Ok(product)
}

fn parse_product_status(raw: &str) -> Result<ProductStatus> {
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(|_| DomainError::validation("invalid status"))
}

fn price_change(
    product: &Product,
    old_price: Money,
    now: chrono::DateTime<Utc>,
) -> ProductPriceHistory {
    ProductPriceHistory {
        id: PriceHistoryId::new(),
        product_id: product.id,
        farmer_id: product.farmer_id,
        old_price,
        new_price: product.price_per_unit,
        changed_at: now,
    }
}
