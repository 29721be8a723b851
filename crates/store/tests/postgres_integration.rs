//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and truncate the tables before
//! each test, so they are serialized with `serial_test`. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{
    CartItem, CartItemId, DisputeStatus, Money, Order, OrderId, OrderStatus, OrderStatusLog,
    PriceHistoryId, Product, ProductId, ProductPriceHistory, ProductStatus, Quantity, Review,
    ReviewId, StatusLogId, User, UserId, UserRole,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{MarketStore, PostgresStore, ProductFilter, ProductSort, StoreError, UnitOfWork};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/0001_create_marketplace_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE reviews, cart_items, product_price_history, order_status_logs, \
         orders, products, users",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

async fn create_user(store: &PostgresStore, email: &str, role: UserRole) -> User {
    let user = User {
        id: UserId::new(),
        name: "Test User".to_string(),
        email: email.to_string(),
        phone: None,
        role,
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        created_at: Utc::now(),
    };
    store.insert_user(&user).await.unwrap();
    user
}

fn test_product(farmer_id: UserId, crop: &str, price: i64) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(),
        farmer_id,
        crop_name: crop.to_string(),
        category: "vegetables".to_string(),
        quantity: Quantity::from(10),
        unit: "kg".to_string(),
        price_per_unit: Money::from(price),
        description: "Fresh".to_string(),
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        image_url: String::new(),
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn test_order(product: &Product, buyer_id: UserId) -> Order {
    let now = Utc::now();
    Order {
        id: OrderId::new(),
        product_id: product.id,
        buyer_id,
        farmer_id: product.farmer_id,
        quantity: Quantity::from(2),
        total_price: product.price_per_unit.checked_times(Quantity::from(2)).unwrap(),
        status: OrderStatus::Pending,
        delivery_address: "12 Market Road".to_string(),
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

#[tokio::test]
#[serial]
async fn order_and_log_commit_together() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let buyer = create_user(&store, "buyer@test.in", UserRole::Buyer).await;
    let product = test_product(farmer.id, "Tomato", 40);
    let order = test_order(&product, buyer.id);

    let mut tx = store.begin().await.unwrap();
    tx.insert_product(&product).await.unwrap();
    tx.insert_order(&order).await.unwrap();
    tx.append_status_log(&OrderStatusLog {
        id: StatusLogId::new(),
        order_id: order.id,
        actor_id: farmer.id,
        from_status: OrderStatus::Pending,
        to_status: OrderStatus::Confirmed,
        reason: "accepted".to_string(),
        category: String::new(),
        note: String::new(),
        created_at: Utc::now(),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.total_price, Money::from(80));
    assert_eq!(stored.status, OrderStatus::Pending);

    let logs = store.list_status_logs(order.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].to_status, OrderStatus::Confirmed);
}

#[tokio::test]
#[serial]
async fn uncommitted_unit_of_work_rolls_back() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let product = test_product(farmer.id, "Onion", 25);

    {
        let mut tx = store.begin().await.unwrap();
        tx.insert_product(&product).await.unwrap();
    }

    assert!(store.get_product(product.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn lock_product_blocks_concurrent_writer() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let product = test_product(farmer.id, "Potato", 20);

    let mut tx = store.begin().await.unwrap();
    tx.insert_product(&product).await.unwrap();
    tx.commit().await.unwrap();

    let mut first = store.begin().await.unwrap();
    let mut locked = first.lock_product(product.id).await.unwrap().unwrap();

    let contender = store.clone();
    let product_id = product.id;
    let handle = tokio::spawn(async move {
        let mut second = contender.begin().await.unwrap();
        let seen = second.lock_product(product_id).await.unwrap().unwrap();
        second.commit().await.unwrap();
        seen.quantity
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!handle.is_finished());

    locked.quantity = Quantity::from(4);
    first.update_product(&locked).await.unwrap();
    first.commit().await.unwrap();

    // The second transaction observes the first one's committed write.
    assert_eq!(handle.await.unwrap(), Quantity::from(4));
}

#[tokio::test]
#[serial]
async fn update_order_leaves_total_price_untouched() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let buyer = create_user(&store, "buyer@test.in", UserRole::Buyer).await;
    let product = test_product(farmer.id, "Okra", 30);
    let order = test_order(&product, buyer.id);

    let mut tx = store.begin().await.unwrap();
    tx.insert_product(&product).await.unwrap();
    tx.insert_order(&order).await.unwrap();
    tx.commit().await.unwrap();

    let mut changed = order.clone();
    changed.total_price = Money::from(1);
    changed.status = OrderStatus::Confirmed;
    changed.confirmed_at = Some(Utc::now());

    let mut tx = store.begin().await.unwrap();
    tx.update_order(&changed).await.unwrap();
    tx.commit().await.unwrap();

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.total_price, Money::from(60));
    assert_eq!(stored.status, OrderStatus::Confirmed);
    assert!(stored.confirmed_at.is_some());
}

#[tokio::test]
#[serial]
async fn duplicate_email_is_unique_violation() {
    let store = get_test_store().await;
    create_user(&store, "same@test.in", UserRole::Farmer).await;

    let dup = User {
        id: UserId::new(),
        name: "Other".to_string(),
        email: "same@test.in".to_string(),
        phone: None,
        role: UserRole::Buyer,
        city: String::new(),
        state: String::new(),
        created_at: Utc::now(),
    };
    let err = store.insert_user(&dup).await.unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { ref constraint } if constraint == "users_email_key"));
}

#[tokio::test]
#[serial]
async fn duplicate_review_is_unique_violation() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let buyer = create_user(&store, "buyer@test.in", UserRole::Buyer).await;
    let product = test_product(farmer.id, "Okra", 30);
    let order = test_order(&product, buyer.id);
    let review = Review {
        id: ReviewId::new(),
        order_id: order.id,
        reviewer_id: buyer.id,
        reviewee_id: farmer.id,
        rating: 4,
        comment: "Good".to_string(),
        created_at: Utc::now(),
    };

    let mut tx = store.begin().await.unwrap();
    tx.insert_product(&product).await.unwrap();
    tx.insert_order(&order).await.unwrap();
    tx.insert_review(&review).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let again = Review {
        id: ReviewId::new(),
        ..review.clone()
    };
    let err = tx.insert_review(&again).await.unwrap_err();
    assert!(err.is_unique_violation());

    let found = store.find_review(order.id, buyer.id).await.unwrap();
    assert_eq!(found.map(|r| r.rating), Some(4));
}

#[tokio::test]
#[serial]
async fn list_products_filters_and_sorts() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let mut older = test_product(farmer.id, "Cherry Tomato", 20);
    older.created_at = Utc::now() - Duration::hours(1);
    let newer = test_product(farmer.id, "Tomato", 60);
    let mut draft = test_product(farmer.id, "Tomato Draft", 10);
    draft.status = ProductStatus::Draft;
    let mut tagged = test_product(farmer.id, "Mango", 90);
    tagged.category = "other".to_string();
    tagged.description = "Sweet. Category: fruits".to_string();

    let mut tx = store.begin().await.unwrap();
    for p in [&older, &newer, &draft, &tagged] {
        tx.insert_product(p).await.unwrap();
    }
    tx.commit().await.unwrap();

    let by_name = store
        .list_products(&ProductFilter {
            crop_name: Some("tomato".to_string()),
            sort: ProductSort::PriceDesc,
            ..ProductFilter::default()
        })
        .await
        .unwrap();
    let names: Vec<_> = by_name.iter().map(|p| p.crop_name.as_str()).collect();
    assert_eq!(names, vec!["Tomato", "Cherry Tomato"]);

    let by_category = store
        .list_products(&ProductFilter {
            category: Some("Fruits".to_string()),
            ..ProductFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].id, tagged.id);

    let limited = store
        .list_products(&ProductFilter {
            limit: Some(1),
            ..ProductFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);

    let drafts = store
        .list_products(&ProductFilter::new().with_status(ProductStatus::Draft))
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
}

#[tokio::test]
#[serial]
async fn price_history_is_newest_first() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let product = test_product(farmer.id, "Garlic", 100);

    let mut tx = store.begin().await.unwrap();
    tx.insert_product(&product).await.unwrap();
    for (old, new) in [(100, 110), (110, 120)] {
        tx.append_price_history(&ProductPriceHistory {
            id: PriceHistoryId::new(),
            product_id: product.id,
            farmer_id: farmer.id,
            old_price: Money::from(old),
            new_price: Money::from(new),
            changed_at: Utc::now(),
        })
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();

    let history = store.list_price_history(product.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].new_price, Money::from(120));
    assert_eq!(history[1].old_price, Money::from(100));
}

#[tokio::test]
#[serial]
async fn cart_upsert_and_clear() {
    let store = get_test_store().await;
    let farmer = create_user(&store, "farmer@test.in", UserRole::Farmer).await;
    let buyer = create_user(&store, "buyer@test.in", UserRole::Buyer).await;
    let product = test_product(farmer.id, "Carrot", 35);
    let now = Utc::now();
    let item = CartItem {
        id: CartItemId::new(),
        buyer_id: buyer.id,
        product_id: product.id,
        quantity: Quantity::from(1),
        created_at: now,
        updated_at: now,
    };

    let mut tx = store.begin().await.unwrap();
    tx.insert_product(&product).await.unwrap();
    tx.save_cart_item(&item).await.unwrap();
    tx.save_cart_item(&CartItem {
        quantity: Quantity::from(3),
        ..item.clone()
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let cart = store.list_cart_items(buyer.id).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, Quantity::from(3));

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.clear_cart(buyer.id).await.unwrap(), 1);
    tx.commit().await.unwrap();
    assert!(store.list_cart_items(buyer.id).await.unwrap().is_empty());
}
