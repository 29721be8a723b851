use std::str::FromStr;

use async_trait::async_trait;
use common::{
    CartItem, CartItemId, Money, Order, OrderId, OrderStatusLog, ParseEnumError, PriceHistoryId,
    Product, ProductId, ProductPriceHistory, Quantity, Review, ReviewId, StatusLogId, User,
    UserId,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{MarketStore, ProductFilter, ProductSort, UnitOfWork},
};

const USER_COLUMNS: &str = "id, name, email, phone, role, city, state, created_at";

const PRODUCT_COLUMNS: &str = "id, farmer_id, crop_name, category, quantity, unit, \
    price_per_unit, description, city, state, image_url, status, created_at, updated_at, deleted_at";

const ORDER_COLUMNS: &str = "id, product_id, buyer_id, farmer_id, quantity, total_price, status, \
    delivery_address, delivery_date, delivery_slot, cancellation_reason, cancellation_type, \
    cancellation_note, dispute_status, dispute_note, confirmed_at, packed_at, \
    out_for_delivery_at, completed_at, cancelled_at, created_at, updated_at";

const LOG_COLUMNS: &str =
    "id, order_id, actor_id, from_status, to_status, reason, category, note, created_at";

const CART_COLUMNS: &str = "id, buyer_id, product_id, quantity, created_at, updated_at";

const REVIEW_COLUMNS: &str =
    "id, order_id, reviewer_id, reviewee_id, rating, comment, created_at";

const PRICE_HISTORY_COLUMNS: &str =
    "id, product_id, farmer_id, old_price, new_price, changed_at";

/// PostgreSQL-backed marketplace store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn parse_enum<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.parse::<T>()
        .map_err(|e: ParseEnumError| StoreError::Decode(e.to_string()))
}

fn parse_optional_enum<T>(raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.filter(|v| !v.is_empty())
        .map(|v| parse_enum(&v))
        .transpose()
}

fn row_to_user(row: PgRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        role: parse_enum(&role)?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_product(row: PgRow) -> Result<Product> {
    let status: String = row.try_get("status")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        farmer_id: UserId::from_uuid(row.try_get::<Uuid, _>("farmer_id")?),
        crop_name: row.try_get("crop_name")?,
        category: row.try_get("category")?,
        quantity: Quantity::new(row.try_get::<Decimal, _>("quantity")?),
        unit: row.try_get("unit")?,
        price_per_unit: Money::new(row.try_get::<Decimal, _>("price_per_unit")?),
        description: row.try_get("description")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        image_url: row.try_get("image_url")?,
        status: parse_enum(&status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn row_to_order(row: PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    let dispute_status: String = row.try_get("dispute_status")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        buyer_id: UserId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
        farmer_id: UserId::from_uuid(row.try_get::<Uuid, _>("farmer_id")?),
        quantity: Quantity::new(row.try_get::<Decimal, _>("quantity")?),
        total_price: Money::new(row.try_get::<Decimal, _>("total_price")?),
        status: parse_enum(&status)?,
        delivery_address: row.try_get("delivery_address")?,
        delivery_date: row.try_get("delivery_date")?,
        delivery_slot: parse_optional_enum(row.try_get("delivery_slot")?)?,
        cancellation_reason: row.try_get("cancellation_reason")?,
        cancellation_type: parse_optional_enum(row.try_get("cancellation_type")?)?,
        cancellation_note: row.try_get("cancellation_note")?,
        dispute_status: parse_enum(&dispute_status)?,
        dispute_note: row.try_get("dispute_note")?,
        confirmed_at: row.try_get("confirmed_at")?,
        packed_at: row.try_get("packed_at")?,
        out_for_delivery_at: row.try_get("out_for_delivery_at")?,
        completed_at: row.try_get("completed_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_status_log(row: PgRow) -> Result<OrderStatusLog> {
    let from: String = row.try_get("from_status")?;
    let to: String = row.try_get("to_status")?;
    Ok(OrderStatusLog {
        id: StatusLogId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        actor_id: UserId::from_uuid(row.try_get::<Uuid, _>("actor_id")?),
        from_status: parse_enum(&from)?,
        to_status: parse_enum(&to)?,
        reason: row.try_get("reason")?,
        category: row.try_get("category")?,
        note: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart_item(row: PgRow) -> Result<CartItem> {
    Ok(CartItem {
        id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        buyer_id: UserId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: Quantity::new(row.try_get::<Decimal, _>("quantity")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_review(row: PgRow) -> Result<Review> {
    let rating: i16 = row.try_get("rating")?;
    Ok(Review {
        id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        reviewer_id: UserId::from_uuid(row.try_get::<Uuid, _>("reviewer_id")?),
        reviewee_id: UserId::from_uuid(row.try_get::<Uuid, _>("reviewee_id")?),
        rating: u8::try_from(rating)
            .map_err(|_| StoreError::Decode(format!("rating out of range: {rating}")))?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_price_history(row: PgRow) -> Result<ProductPriceHistory> {
    Ok(ProductPriceHistory {
        id: PriceHistoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        farmer_id: UserId::from_uuid(row.try_get::<Uuid, _>("farmer_id")?),
        old_price: Money::new(row.try_get::<Decimal, _>("old_price")?),
        new_price: Money::new(row.try_get::<Decimal, _>("new_price")?),
        changed_at: row.try_get("changed_at")?,
    })
}

#[async_trait]
impl MarketStore for PostgresStore {
    type Tx = PostgresUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnitOfWork { tx })
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone, role, city, state, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(&user.city)
        .bind(&user.state)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_user).transpose()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_product).transpose()
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let filter = filter.normalized();
        let mut sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL");
        let mut param_count = 0;

        // Build dynamic query
        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if filter.farmer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND farmer_id = ${param_count}"));
        }
        if filter.crop_name.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND crop_name ILIKE ${param_count}"));
        }
        if filter.city.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND LOWER(city) = LOWER(${param_count})"));
        }
        if filter.state.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND LOWER(state) = LOWER(${param_count})"));
        }
        if filter.category.is_some() {
            param_count += 1;
            let category = param_count;
            param_count += 1;
            sql.push_str(&format!(
                " AND (category = ${category} OR LOWER(description) LIKE ${param_count})"
            ));
        }
        if filter.min_price.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND price_per_unit >= ${param_count}"));
        }
        if filter.max_price.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND price_per_unit <= ${param_count}"));
        }

        sql.push_str(match filter.sort {
            ProductSort::PriceAsc => " ORDER BY price_per_unit ASC",
            ProductSort::PriceDesc => " ORDER BY price_per_unit DESC",
            ProductSort::DateAsc => " ORDER BY created_at ASC",
            ProductSort::DateDesc => " ORDER BY created_at DESC",
        });

        if filter.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(farmer) = filter.farmer_id {
            query = query.bind(farmer.as_uuid());
        }
        if let Some(ref name) = filter.crop_name {
            query = query.bind(format!("%{name}%"));
        }
        if let Some(ref city) = filter.city {
            query = query.bind(city.clone());
        }
        if let Some(ref state) = filter.state {
            query = query.bind(state.clone());
        }
        if let Some(ref category) = filter.category {
            query = query
                .bind(category.clone())
                .bind(format!("%category: {category}%"));
        }
        if let Some(min) = filter.min_price {
            query = query.bind(min.amount());
        }
        if let Some(max) = filter.max_price {
            query = query.bind(max.amount());
        }
        if let Some(limit) = filter.limit {
            query = query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn list_products_by_farmer(&self, farmer_id: UserId) -> Result<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE farmer_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(farmer_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_order).transpose()
    }

    async fn list_orders_by_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(buyer_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn list_orders_by_farmer(&self, farmer_id: UserId) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE farmer_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(farmer_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn list_status_logs(&self, order_id: OrderId) -> Result<Vec<OrderStatusLog>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM order_status_logs WHERE order_id = $1 ORDER BY seq ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_status_log).collect()
    }

    async fn list_cart_items(&self, buyer_id: UserId) -> Result<Vec<CartItem>> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE buyer_id = $1 ORDER BY updated_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(buyer_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_cart_item).collect()
    }

    async fn find_review(
        &self,
        order_id: OrderId,
        reviewer_id: UserId,
    ) -> Result<Option<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE order_id = $1 AND reviewer_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .bind(reviewer_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_review).transpose()
    }

    async fn list_reviews_by_reviewee(&self, reviewee_id: UserId) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE reviewee_id = $1 ORDER BY seq DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(reviewee_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_review).collect()
    }

    async fn list_reviews_by_reviewer(&self, reviewer_id: UserId) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE reviewer_id = $1 ORDER BY seq DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(reviewer_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_review).collect()
    }

    async fn list_price_history(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductPriceHistory>> {
        let sql = format!(
            "SELECT {PRICE_HISTORY_COLUMNS} FROM product_price_history \
             WHERE product_id = $1 ORDER BY seq DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(product_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_price_history).collect()
    }
}

/// Unit of work backed by one PostgreSQL transaction.
///
/// `lock_*` reads use `SELECT ... FOR UPDATE`. Dropping the value rolls the
/// transaction back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(row_to_product).transpose()
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(row_to_order).transpose()
    }

    async fn cart_items(&mut self, buyer_id: UserId) -> Result<Vec<CartItem>> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE buyer_id = $1 \
             ORDER BY updated_at DESC FOR UPDATE"
        );
        let rows = sqlx::query(&sql)
            .bind(buyer_id.as_uuid())
            .fetch_all(&mut *self.tx)
            .await?;
        rows.into_iter().map(row_to_cart_item).collect()
    }

    async fn cart_item(
        &mut self,
        buyer_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM cart_items WHERE buyer_id = $1 AND product_id = $2 \
             FOR UPDATE"
        );
        let row = sqlx::query(&sql)
            .bind(buyer_id.as_uuid())
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(row_to_cart_item).transpose()
    }

    async fn insert_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, farmer_id, crop_name, category, quantity, unit,
                price_per_unit, description, city, state, image_url, status,
                created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.farmer_id.as_uuid())
        .bind(&product.crop_name)
        .bind(&product.category)
        .bind(product.quantity.value())
        .bind(&product.unit)
        .bind(product.price_per_unit.amount())
        .bind(&product.description)
        .bind(&product.city)
        .bind(&product.state)
        .bind(&product.image_url)
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.deleted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update_product(&mut self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET crop_name = $2, category = $3, quantity = $4, unit = $5, price_per_unit = $6,
                description = $7, city = $8, state = $9, image_url = $10, status = $11,
                updated_at = $12, deleted_at = $13
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.crop_name)
        .bind(&product.category)
        .bind(product.quantity.value())
        .bind(&product.unit)
        .bind(product.price_per_unit.amount())
        .bind(&product.description)
        .bind(&product.city)
        .bind(&product.state)
        .bind(&product.image_url)
        .bind(product.status.as_str())
        .bind(product.updated_at)
        .bind(product.deleted_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, product_id, buyer_id, farmer_id, quantity, total_price,
                status, delivery_address, delivery_date, delivery_slot, cancellation_reason,
                cancellation_type, cancellation_note, dispute_status, dispute_note,
                confirmed_at, packed_at, out_for_delivery_at, completed_at, cancelled_at,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.product_id.as_uuid())
        .bind(order.buyer_id.as_uuid())
        .bind(order.farmer_id.as_uuid())
        .bind(order.quantity.value())
        .bind(order.total_price.amount())
        .bind(order.status.as_str())
        .bind(&order.delivery_address)
        .bind(order.delivery_date)
        .bind(order.delivery_slot.map(|s| s.as_str()))
        .bind(&order.cancellation_reason)
        .bind(order.cancellation_type.map(|t| t.as_str()))
        .bind(&order.cancellation_note)
        .bind(order.dispute_status.as_str())
        .bind(&order.dispute_note)
        .bind(order.confirmed_at)
        .bind(order.packed_at)
        .bind(order.out_for_delivery_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, delivery_address = $3, delivery_date = $4, delivery_slot = $5,
                cancellation_reason = $6, cancellation_type = $7, cancellation_note = $8,
                dispute_status = $9, dispute_note = $10, confirmed_at = $11, packed_at = $12,
                out_for_delivery_at = $13, completed_at = $14, cancelled_at = $15,
                updated_at = $16
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.delivery_address)
        .bind(order.delivery_date)
        .bind(order.delivery_slot.map(|s| s.as_str()))
        .bind(&order.cancellation_reason)
        .bind(order.cancellation_type.map(|t| t.as_str()))
        .bind(&order.cancellation_note)
        .bind(order.dispute_status.as_str())
        .bind(&order.dispute_note)
        .bind(order.confirmed_at)
        .bind(order.packed_at)
        .bind(order.out_for_delivery_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn append_status_log(&mut self, log: &OrderStatusLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_status_logs (id, order_id, actor_id, from_status, to_status,
                reason, category, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.order_id.as_uuid())
        .bind(log.actor_id.as_uuid())
        .bind(log.from_status.as_str())
        .bind(log.to_status.as_str())
        .bind(&log.reason)
        .bind(&log.category)
        .bind(&log.note)
        .bind(log.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn append_price_history(&mut self, entry: &ProductPriceHistory) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_price_history (id, product_id, farmer_id, old_price,
                new_price, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.product_id.as_uuid())
        .bind(entry.farmer_id.as_uuid())
        .bind(entry.old_price.amount())
        .bind(entry.new_price.amount())
        .bind(entry.changed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn save_cart_item(&mut self, item: &CartItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, buyer_id, product_id, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET quantity = EXCLUDED.quantity, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.buyer_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity.value())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&mut self, buyer_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1")
            .bind(buyer_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_review(&mut self, review: &Review) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, order_id, reviewer_id, reviewee_id, rating, comment,
                created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.order_id.as_uuid())
        .bind(review.reviewer_id.as_uuid())
        .bind(review.reviewee_id.as_uuid())
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
