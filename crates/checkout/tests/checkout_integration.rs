//! Integration tests for cart checkout.

use std::sync::Arc;

use checkout::{AddToCart, CartService, Checkout, CheckoutService};
use common::{Money, OrderStatus, Product, ProductStatus, Quantity, User, UserRole};
use domain::{
    AccountService, ChannelNotifier, DomainError, ErrorKind, OrderNotification, ProductDraft,
    ProductService, RegisterAccount,
};
use store::{InMemoryStore, MarketStore};

struct TestHarness {
    store: InMemoryStore,
    carts: CartService<InMemoryStore>,
    checkout: CheckoutService<InMemoryStore>,
    products: ProductService<InMemoryStore>,
    farmer: User,
    buyer: User,
}

impl TestHarness {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        let accounts = AccountService::new(store.clone());
        let farmer = accounts
            .register(RegisterAccount::new("Meena", "meena@farm.in", UserRole::Farmer))
            .await
            .unwrap();
        let buyer = accounts
            .register(RegisterAccount::new("Kiran", "kiran@shop.in", UserRole::Buyer))
            .await
            .unwrap();
        Self {
            carts: CartService::new(store.clone()),
            checkout: CheckoutService::new(store.clone()),
            products: ProductService::new(store.clone()),
            store,
            farmer,
            buyer,
        }
    }

    async fn product(&self, name: &str, quantity: i64, price: i64) -> Product {
        self.products
            .create_product(
                self.farmer.id,
                ProductDraft::new(name, "vegetables", quantity, "kg", price),
            )
            .await
            .unwrap()
    }

    async fn stock(&self, product: &Product) -> Product {
        self.store.get_product(product.id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn test_checkout_creates_one_order_per_item_and_clears_cart() {
    let h = TestHarness::new().await;
    let carrots = h.product("Carrot", 10, 30).await;
    let beans = h.product("Beans", 4, 60).await;

    h.carts
        .add_to_cart(h.buyer.id, AddToCart::new(carrots.id, 3))
        .await
        .unwrap();
    h.carts
        .add_to_cart(h.buyer.id, AddToCart::new(beans.id, 4))
        .await
        .unwrap();

    let orders = h
        .checkout
        .checkout(h.buyer.id, Checkout::deliver_to("  7 Lake View  "))
        .await
        .unwrap();

    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|d| d.order.status == OrderStatus::Pending));
    assert!(orders.iter().all(|d| d.order.delivery_address == "7 Lake View"));
    assert!(orders.iter().all(|d| d.order.farmer_id == h.farmer.id));

    let totals: Vec<_> = orders.iter().map(|d| d.order.total_price).collect();
    assert!(totals.contains(&Money::from(90)));
    assert!(totals.contains(&Money::from(240)));

    assert_eq!(h.stock(&carrots).await.quantity, Quantity::from(7));
    let beans_after = h.stock(&beans).await;
    assert_eq!(beans_after.quantity, Quantity::ZERO);
    assert_eq!(beans_after.status, ProductStatus::Sold);

    assert!(h.carts.cart(h.buyer.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_is_all_or_nothing() {
    let h = TestHarness::new().await;
    let a = h.product("Spinach", 5, 20).await;
    let b = h.product("Garlic", 10, 80).await;

    h.carts
        .add_to_cart(h.buyer.id, AddToCart::new(a.id, 5))
        .await
        .unwrap();
    h.carts
        .add_to_cart(h.buyer.id, AddToCart::new(b.id, 10))
        .await
        .unwrap();

    // Stock of B drops below the carted quantity.
    h.products
        .update_product(
            b.id,
            h.farmer.id,
            ProductDraft::new("Garlic", "vegetables", 3, "kg", 80),
        )
        .await
        .unwrap();

    let err = h
        .checkout
        .checkout(h.buyer.id, Checkout::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InsufficientStock { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(h.store.order_count().await, 0);
    let a_after = h.stock(&a).await;
    assert_eq!(a_after.quantity, Quantity::from(5));
    assert_eq!(a_after.status, ProductStatus::Active);
    assert_eq!(h.carts.cart(h.buyer.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_checkout_rejects_unavailable_products() {
    let h = TestHarness::new().await;
    let p = h.product("Mango", 10, 120).await;
    h.carts
        .add_to_cart(h.buyer.id, AddToCart::new(p.id, 2))
        .await
        .unwrap();
    h.products
        .update_status(p.id, h.farmer.id, "expired")
        .await
        .unwrap();

    let err = h
        .checkout
        .checkout(h.buyer.id, Checkout::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ProductUnavailable(_)));
    assert_eq!(h.stock(&p).await.quantity, Quantity::from(10));
}

#[tokio::test]
async fn test_empty_cart_fails() {
    let h = TestHarness::new().await;
    let err = h
        .checkout
        .checkout(h.buyer.id, Checkout::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::CartEmpty));
    assert_eq!(err.to_string(), "cart is empty");
}

#[tokio::test]
async fn test_failed_commit_keeps_cart_and_stock() {
    let h = TestHarness::new().await;
    let p = h.product("Potato", 10, 25).await;
    h.carts
        .add_to_cart(h.buyer.id, AddToCart::new(p.id, 4))
        .await
        .unwrap();

    h.store.set_fail_on_commit(true);
    let err = h
        .checkout
        .checkout(h.buyer.id, Checkout::default())
        .await
        .unwrap_err();
    h.store.set_fail_on_commit(false);

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(h.stock(&p).await.quantity, Quantity::from(10));
    assert_eq!(h.carts.cart(h.buyer.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_committed_checkout_succeeds_when_parties_cannot_be_loaded() {
    let h = TestHarness::new().await;
    let p = h.product("Onion", 10, 20).await;
    h.carts
        .add_to_cart(h.buyer.id, AddToCart::new(p.id, 4))
        .await
        .unwrap();

    h.store.set_fail_on_lookup(true);
    let orders = h
        .checkout
        .checkout(h.buyer.id, Checkout::default())
        .await
        .unwrap();
    h.store.set_fail_on_lookup(false);

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.status, OrderStatus::Pending);
    assert_eq!(orders[0].order.total_price, Money::from(80));
    assert_eq!(orders[0].buyer, None);
    assert_eq!(orders[0].farmer, None);
    assert_eq!(
        orders[0].product.as_ref().map(|p| p.quantity),
        Some(Quantity::from(6))
    );

    assert_eq!(h.stock(&p).await.quantity, Quantity::from(6));
    assert!(h.store.list_cart_items(h.buyer.id).await.unwrap().is_empty());
    assert_eq!(
        h.store.list_orders_by_buyer(h.buyer.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_concurrent_checkouts_never_oversell() {
    let h = TestHarness::new().await;
    let p = h.product("Onion", 6, 35).await;
    let accounts = AccountService::new(h.store.clone());

    let mut buyers = Vec::new();
    for i in 0..5 {
        let buyer = accounts
            .register(RegisterAccount::new(
                format!("Buyer {i}"),
                format!("buyer{i}@shop.in"),
                UserRole::Buyer,
            ))
            .await
            .unwrap();
        h.carts
            .add_to_cart(buyer.id, AddToCart::new(p.id, 2))
            .await
            .unwrap();
        buyers.push(buyer.id);
    }

    let service = Arc::new(CheckoutService::new(h.store.clone()));
    let handles: Vec<_> = buyers
        .into_iter()
        .map(|buyer| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.checkout(buyer, Checkout::default()).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 3);
    let after = h.stock(&p).await;
    assert_eq!(after.quantity, Quantity::ZERO);
    assert_eq!(after.status, ProductStatus::Sold);
}

#[tokio::test]
async fn test_checkout_notifies_each_order() {
    let h = TestHarness::new().await;
    let (notifier, mut rx) = ChannelNotifier::new();
    let service = CheckoutService::new(h.store.clone()).with_notifier(Arc::new(notifier));
    let a = h.product("Peas", 10, 50).await;
    let b = h.product("Corn", 10, 15).await;
    for p in [&a, &b] {
        h.carts
            .add_to_cart(h.buyer.id, AddToCart::new(p.id, 1))
            .await
            .unwrap();
    }

    let orders = service
        .checkout(h.buyer.id, Checkout::default())
        .await
        .unwrap();

    for details in &orders {
        let note = rx.recv().await.unwrap();
        assert_eq!(
            note,
            OrderNotification::OrderPlaced {
                order_id: details.order.id,
                buyer_id: h.buyer.id,
                farmer_id: h.farmer.id,
            }
        );
    }
}
