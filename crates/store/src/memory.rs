use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{
    CartItem, CartItemId, Order, OrderId, OrderStatusLog, Product, ProductId,
    ProductPriceHistory, Review, User, UserId,
};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    Result, StoreError,
    store::{MarketStore, ProductFilter, UnitOfWork, sort_products},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    status_logs: Vec<OrderStatusLog>,
    price_history: Vec<ProductPriceHistory>,
    cart_items: HashMap<CartItemId, CartItem>,
    reviews: Vec<Review>,
}

impl Tables {
    fn cart_for(&self, buyer_id: UserId) -> Vec<CartItem> {
        let mut items: Vec<_> = self
            .cart_items
            .values()
            .filter(|i| i.buyer_id == buyer_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        items
    }
}

/// In-memory marketplace store for tests and local runs.
///
/// A single writer lock serializes units of work, which gives the same
/// guarantees as row locks at coarser granularity. Each unit of work stages
/// its writes on a private copy of the tables and publishes them on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    writer: Arc<Mutex<()>>,
    fail_on_commit: Arc<AtomicBool>,
    fail_on_lookup: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent commit fail with [`StoreError::Unavailable`].
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Makes committed-state user and product lookups fail with
    /// [`StoreError::Unavailable`]. Units of work are unaffected.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.fail_on_lookup.store(fail, Ordering::SeqCst);
    }

    fn check_lookup(&self) -> Result<()> {
        if self.fail_on_lookup.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "lookup rejected by failure injection".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the total number of status log rows.
    pub async fn status_log_count(&self) -> usize {
        self.tables.read().await.status_logs.len()
    }

    /// Returns the total number of orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    type Tx = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.writer.clone().lock_owned().await;
        let staged = self.tables.read().await.clone();
        Ok(InMemoryUnitOfWork {
            _guard: guard,
            staged,
            tables: self.tables.clone(),
            fail_on_commit: self.fail_on_commit.clone(),
        })
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let _writer = self.writer.lock().await;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            });
        }
        if user.phone.is_some() && tables.users.values().any(|u| u.phone == user.phone) {
            return Err(StoreError::UniqueViolation {
                constraint: "users_phone_key".to_string(),
            });
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.check_lookup()?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.check_lookup()?;
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let filter = filter.normalized();
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        sort_products(&mut products, filter.sort);
        if let Some(limit) = filter.limit {
            products.truncate(limit);
        }
        Ok(products)
    }

    async fn list_products_by_farmer(&self, farmer_id: UserId) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|p| p.farmer_id == farmer_id && !p.is_deleted())
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders_by_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders_by_farmer(&self, farmer_id: UserId) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.farmer_id == farmer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_status_logs(&self, order_id: OrderId) -> Result<Vec<OrderStatusLog>> {
        let tables = self.tables.read().await;
        Ok(tables
            .status_logs
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_cart_items(&self, buyer_id: UserId) -> Result<Vec<CartItem>> {
        Ok(self.tables.read().await.cart_for(buyer_id))
    }

    async fn find_review(
        &self,
        order_id: OrderId,
        reviewer_id: UserId,
    ) -> Result<Option<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.order_id == order_id && r.reviewer_id == reviewer_id)
            .cloned())
    }

    async fn list_reviews_by_reviewee(&self, reviewee_id: UserId) -> Result<Vec<Review>> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<_> = tables
            .reviews
            .iter()
            .filter(|r| r.reviewee_id == reviewee_id)
            .cloned()
            .collect();
        reviews.reverse();
        Ok(reviews)
    }

    async fn list_reviews_by_reviewer(&self, reviewer_id: UserId) -> Result<Vec<Review>> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<_> = tables
            .reviews
            .iter()
            .filter(|r| r.reviewer_id == reviewer_id)
            .cloned()
            .collect();
        reviews.reverse();
        Ok(reviews)
    }

    async fn list_price_history(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductPriceHistory>> {
        let tables = self.tables.read().await;
        let mut history: Vec<_> = tables
            .price_history
            .iter()
            .filter(|h| h.product_id == product_id)
            .cloned()
            .collect();
        history.reverse();
        Ok(history)
    }
}

/// Unit of work over [`InMemoryStore`].
///
/// Holds the store's writer lock for its whole lifetime.
pub struct InMemoryUnitOfWork {
    _guard: OwnedMutexGuard<()>,
    staged: Tables,
    tables: Arc<RwLock<Tables>>,
    fail_on_commit: Arc<AtomicBool>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.staged.orders.get(&id).cloned())
    }

    async fn cart_items(&mut self, buyer_id: UserId) -> Result<Vec<CartItem>> {
        Ok(self.staged.cart_for(buyer_id))
    }

    async fn cart_item(
        &mut self,
        buyer_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>> {
        Ok(self
            .staged
            .cart_items
            .values()
            .find(|i| i.buyer_id == buyer_id && i.product_id == product_id)
            .cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.staged.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        match self.staged.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(StoreError::Decode(format!("product {} does not exist", product.id))),
        }
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        match self.staged.orders.get_mut(&order.id) {
            Some(existing) => {
                let total_price = existing.total_price;
                *existing = order.clone();
                existing.total_price = total_price;
                Ok(())
            }
            None => Err(StoreError::Decode(format!("order {} does not exist", order.id))),
        }
    }

    async fn append_status_log(&mut self, log: &OrderStatusLog) -> Result<()> {
        self.staged.status_logs.push(log.clone());
        Ok(())
    }

    async fn append_price_history(&mut self, entry: &ProductPriceHistory) -> Result<()> {
        self.staged.price_history.push(entry.clone());
        Ok(())
    }

    async fn save_cart_item(&mut self, item: &CartItem) -> Result<()> {
        let duplicate = self.staged.cart_items.values().any(|i| {
            i.id != item.id && i.buyer_id == item.buyer_id && i.product_id == item.product_id
        });
        if duplicate {
            return Err(StoreError::UniqueViolation {
                constraint: "cart_items_buyer_product_key".to_string(),
            });
        }
        self.staged.cart_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool> {
        Ok(self.staged.cart_items.remove(&id).is_some())
    }

    async fn clear_cart(&mut self, buyer_id: UserId) -> Result<u64> {
        let before = self.staged.cart_items.len();
        self.staged.cart_items.retain(|_, i| i.buyer_id != buyer_id);
        Ok((before - self.staged.cart_items.len()) as u64)
    }

    async fn insert_review(&mut self, review: &Review) -> Result<()> {
        let duplicate = self
            .staged
            .reviews
            .iter()
            .any(|r| r.order_id == review.order_id && r.reviewer_id == review.reviewer_id);
        if duplicate {
            return Err(StoreError::UniqueViolation {
                constraint: "reviews_order_reviewer_key".to_string(),
            });
        }
        self.staged.reviews.push(review.clone());
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        if self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "commit rejected by failure injection".to_string(),
            ));
        }
        *self.tables.write().await = self.staged;
        Ok(())
    }
}
