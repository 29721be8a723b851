//! Account registration and lookup.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::User;
use domain::RegisterAccount;
use store::MarketStore;

use crate::AppState;
use crate::actor::Actor;
use crate::error::ApiError;

/// POST /accounts: create an account.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterAccount>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.accounts.register(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /accounts/me: the calling account.
#[tracing::instrument(skip(state))]
pub async fn me<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.accounts.get(actor.id).await?))
}
