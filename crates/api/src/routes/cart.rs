//! Buyer cart and checkout.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{AddToCart, CartLine, Checkout};
use common::{CartItem, CartItemId, Quantity};
use domain::OrderDetails;
use serde::{Deserialize, Serialize};
use store::MarketStore;

use super::parse_id;
use crate::AppState;
use crate::actor::Buyer;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: Quantity,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub orders: Vec<OrderDetails>,
}

#[tracing::instrument(skip(state))]
pub async fn get<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
) -> Result<Json<Vec<CartLine>>, ApiError> {
    Ok(Json(state.cart.cart(buyer_id).await?))
}

/// POST /cart: add a product, merging with an existing line.
#[tracing::instrument(skip(state, cmd))]
pub async fn add<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
    Json(cmd): Json<AddToCart>,
) -> Result<(StatusCode, Json<CartItem>), ApiError> {
    let item = state.cart.add_to_cart(buyer_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[tracing::instrument(skip(state))]
pub async fn update<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
    Path(id): Path<String>,
    Json(req): Json<UpdateQuantity>,
) -> Result<Json<CartItem>, ApiError> {
    let item_id = parse_id(&id, CartItemId::from_uuid)?;
    let item = state
        .cart
        .update_quantity(buyer_id, item_id, req.quantity)
        .await?;
    Ok(Json(item))
}

#[tracing::instrument(skip(state))]
pub async fn remove<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let item_id = parse_id(&id, CartItemId::from_uuid)?;
    state.cart.remove_item(buyer_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cart/checkout: one order per cart line, all or nothing.
#[tracing::instrument(skip(state, cmd))]
pub async fn checkout<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
    Json(cmd): Json<Checkout>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let orders = state.checkout.checkout(buyer_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { orders })))
}
