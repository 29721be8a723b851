use std::collections::HashMap;

use common::{Order, Product, ProductId, User, UserId};
use serde::Serialize;
use store::MarketStore;

use crate::error::Result;

/// An order with its product and both parties resolved.
///
/// Associations are `None` when the referenced row is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub product: Option<Product>,
    pub buyer: Option<User>,
    pub farmer: Option<User>,
}

impl OrderDetails {
    /// Crop name of the ordered product, or a generic label.
    pub fn product_name(&self) -> &str {
        self.product
            .as_ref()
            .map(|p| p.crop_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Produce")
    }

    pub fn buyer_name(&self) -> &str {
        self.buyer.as_ref().map(|u| u.name.as_str()).unwrap_or_default()
    }

    pub fn unit(&self) -> &str {
        self.product.as_ref().map(|p| p.unit.as_str()).unwrap_or_default()
    }
}

/// Resolves associations for a batch of orders, fetching each row once.
pub async fn hydrate<S: MarketStore>(store: &S, orders: Vec<Order>) -> Result<Vec<OrderDetails>> {
    let mut products: HashMap<ProductId, Option<Product>> = HashMap::new();
    let mut users: HashMap<UserId, Option<User>> = HashMap::new();

    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        if !products.contains_key(&order.product_id) {
            let product = store.get_product(order.product_id).await?;
            products.insert(order.product_id, product);
        }
        for user_id in [order.buyer_id, order.farmer_id] {
            if !users.contains_key(&user_id) {
                let user = store.get_user(user_id).await?;
                users.insert(user_id, user);
            }
        }

        details.push(OrderDetails {
            product: products.get(&order.product_id).cloned().flatten(),
            buyer: users.get(&order.buyer_id).cloned().flatten(),
            farmer: users.get(&order.farmer_id).cloned().flatten(),
            order,
        });
    }
    Ok(details)
}

/// Resolves associations for one order.
pub async fn hydrate_one<S: MarketStore>(store: &S, order: Order) -> Result<OrderDetails> {
    let product = store.get_product(order.product_id).await?;
    let buyer = store.get_user(order.buyer_id).await?;
    let farmer = store.get_user(order.farmer_id).await?;
    Ok(OrderDetails {
        order,
        product,
        buyer,
        farmer,
    })
}
