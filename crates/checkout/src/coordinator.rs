//! Checkout coordinator: converts a cart into orders in one unit of work.

use std::sync::Arc;

use chrono::Utc;
use common::{Order, Product, UserId};
use domain::notifier::dispatch;
use domain::order::inventory;
use domain::{
    DomainError, NoopNotifier, OrderDetails, OrderNotification, OrderNotifier, Result, hydrate,
};
use serde::Deserialize;
use store::{MarketStore, UnitOfWork};

const STEP_VALIDATE_STOCK: &str = "validate_stock";
const STEP_PLACE_ORDERS: &str = "place_orders";
const STEP_CLEAR_CART: &str = "clear_cart";

/// Command to check out the buyer's whole cart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Checkout {
    #[serde(default)]
    pub delivery_address: String,
}

impl Checkout {
    pub fn deliver_to(address: impl Into<String>) -> Self {
        Self {
            delivery_address: address.into(),
        }
    }
}

/// Orchestrates multi-item checkout.
///
/// Stock is validated for every item before the first order is written, and
/// every write shares one unit of work, so a checkout either creates one
/// order per cart item and empties the cart or changes nothing.
pub struct CheckoutService<S: MarketStore> {
    store: S,
    notifier: Arc<dyn OrderNotifier>,
}

impl<S: MarketStore> CheckoutService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            notifier: Arc::new(NoopNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OrderNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Checks out the buyer's cart, returning the created orders in cart order.
    ///
    /// Once the unit of work commits, the checkout has succeeded. If the
    /// parties cannot be loaded afterwards, the orders are returned with
    /// only their product attached.
    #[tracing::instrument(skip(self, cmd))]
    pub async fn checkout(&self, buyer_id: UserId, cmd: Checkout) -> Result<Vec<OrderDetails>> {
        let started = std::time::Instant::now();
        let result = self.run(buyer_id, cmd).await;
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        let placed = match result {
            Ok(placed) => placed,
            Err(e) => {
                let outcome = match e {
                    DomainError::Store(_) => "failed",
                    _ => "rejected",
                };
                metrics::counter!("checkouts_total", "outcome" => outcome).increment(1);
                tracing::warn!(%buyer_id, error = %e, "checkout aborted");
                return Err(e);
            }
        };

        metrics::counter!("checkouts_total", "outcome" => "completed").increment(1);
        metrics::counter!("orders_created_total").increment(placed.len() as u64);
        for (order, _) in &placed {
            dispatch(
                self.notifier.as_ref(),
                OrderNotification::OrderPlaced {
                    order_id: order.id,
                    buyer_id,
                    farmer_id: order.farmer_id,
                },
            )
            .await;
        }

        let orders = placed.iter().map(|(order, _)| order.clone()).collect();
        match hydrate(&self.store, orders).await {
            Ok(details) => Ok(details),
            Err(e) => {
                tracing::warn!(%buyer_id, error = %e, "checkout committed, returning orders without parties");
                Ok(placed
                    .into_iter()
                    .map(|(order, product)| OrderDetails {
                        order,
                        product: Some(product),
                        buyer: None,
                        farmer: None,
                    })
                    .collect())
            }
        }
    }

    /// Runs the checkout in one unit of work, returning each order with its
    /// product as committed.
    async fn run(&self, buyer_id: UserId, cmd: Checkout) -> Result<Vec<(Order, Product)>> {
        let now = Utc::now();
        let address = cmd.delivery_address.trim();
        let mut tx = self.store.begin().await?;

        let items = tx.cart_items(buyer_id).await?;
        if items.is_empty() {
            return Err(DomainError::CartEmpty);
        }

        tracing::debug!(step = STEP_VALIDATE_STOCK, items = items.len(), "checkout step started");
        let mut locked = Vec::with_capacity(items.len());
        for item in &items {
            let product =
                inventory::lock_reservable(&mut tx, item.product_id, buyer_id, item.quantity)
                    .await?;
            locked.push(product);
        }

        tracing::debug!(step = STEP_PLACE_ORDERS, "checkout step started");
        let mut orders = Vec::with_capacity(items.len());
        for (item, product) in items.iter().zip(locked.iter_mut()) {
            let order =
                inventory::place_order(&mut tx, product, buyer_id, item.quantity, address, now)
                    .await?;
            orders.push(order);
        }

        tracing::debug!(step = STEP_CLEAR_CART, "checkout step started");
        tx.clear_cart(buyer_id).await?;
        tx.commit().await?;

        tracing::info!(%buyer_id, orders = orders.len(), "checkout completed");
        Ok(orders.into_iter().zip(locked).collect())
    }
}
