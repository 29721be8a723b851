//! Order placement, status updates, reviews and disputes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderStatusLog, Review};
use domain::{CreateOrder, OrderDetails, SubmitReview, UpdateOrderStatus};
use serde::Deserialize;
use store::MarketStore;

use super::parse_id;
use crate::AppState;
use crate::actor::{Actor, Buyer, Farmer};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DisputeRequest {
    pub note: String,
}

/// POST /orders: buy a product directly.
#[tracing::instrument(skip(state, cmd))]
pub async fn create<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
    Json(cmd): Json<CreateOrder>,
) -> Result<(StatusCode, Json<OrderDetails>), ApiError> {
    let order = state.orders.create_order(buyer_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/:id: visible to either party.
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    Ok(Json(state.orders.get_order(order_id, actor.id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn history<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderStatusLog>>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    Ok(Json(state.orders.status_history(order_id, actor.id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn mine<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
) -> Result<Json<Vec<OrderDetails>>, ApiError> {
    Ok(Json(state.orders.orders_for_buyer(buyer_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn for_farmer<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
) -> Result<Json<Vec<OrderDetails>>, ApiError> {
    Ok(Json(state.orders.orders_for_farmer(farmer_id).await?))
}

/// PUT /orders/:id/status: transition and/or detail update.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderStatus>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    Ok(Json(state.orders.transition(order_id, actor.id, req).await?))
}

/// DELETE /orders/:id: cancel with the generic reason.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    Ok(Json(state.orders.cancel_order(order_id, actor.id).await?))
}

#[tracing::instrument(skip(state, cmd))]
pub async fn review<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
    Path(id): Path<String>,
    Json(cmd): Json<SubmitReview>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    let review = state.reviews.submit_review(order_id, buyer_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[tracing::instrument(skip(state, req))]
pub async fn open_dispute<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
    Json(req): Json<DisputeRequest>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    let order = state
        .disputes
        .open_dispute(order_id, farmer_id, &req.note)
        .await?;
    Ok(Json(order))
}

#[tracing::instrument(skip(state, req))]
pub async fn resolve_dispute<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
    Json(req): Json<DisputeRequest>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    let order = state
        .disputes
        .resolve_dispute(order_id, farmer_id, &req.note)
        .await?;
    Ok(Json(order))
}

#[tracing::instrument(skip(state, req))]
pub async fn reject_dispute<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
    Json(req): Json<DisputeRequest>,
) -> Result<Json<OrderDetails>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    let order = state
        .disputes
        .reject_dispute(order_id, farmer_id, &req.note)
        .await?;
    Ok(Json(order))
}
