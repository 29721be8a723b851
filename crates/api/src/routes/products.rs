//! Product catalogue endpoints: public reads, farmer-only writes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, Product, ProductId, ProductPriceHistory, ProductStatus};
use domain::ProductDraft;
use serde::{Deserialize, Serialize};
use store::{MarketStore, ProductFilter, ProductSort};

use super::parse_id;
use crate::AppState;
use crate::actor::Farmer;
use crate::error::ApiError;

// -- Request types --

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub crop_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub status: Option<ProductStatus>,
    pub sort: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<ProductFilter, ApiError> {
        let sort = match self.sort.as_deref() {
            Some(raw) => raw.parse::<ProductSort>().map_err(ApiError::BadRequest)?,
            None => ProductSort::default(),
        };
        Ok(ProductFilter {
            crop_name: self.crop_name,
            city: self.city,
            state: self.state,
            category: self.category,
            min_price: self.min_price,
            max_price: self.max_price,
            status: self.status,
            sort,
            ..ProductFilter::default()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub price_per_unit: Money,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub product_ids: Vec<ProductId>,
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct BulkStatusResponse {
    pub updated: usize,
}

// -- Handlers --

/// GET /products: filtered, sorted listing.
#[tracing::instrument(skip(state))]
pub async fn list<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(state.products.list_products(&filter).await?))
}

/// GET /products/search?q=&limit=
#[tracing::instrument(skip(state))]
pub async fn search<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.search(&query.q, query.limit).await?))
}

#[tracing::instrument(skip(state))]
pub async fn get<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_id(&id, ProductId::from_uuid)?;
    Ok(Json(state.products.get_product(product_id).await?))
}

/// GET /products/my/listings: every product of the calling farmer.
#[tracing::instrument(skip(state))]
pub async fn mine<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.products.products_for_farmer(farmer_id).await?))
}

#[tracing::instrument(skip(state, draft))]
pub async fn create<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.products.create_product(farmer_id, draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[tracing::instrument(skip(state, draft))]
pub async fn update<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_id(&id, ProductId::from_uuid)?;
    let product = state
        .products
        .update_product(product_id, farmer_id, draft)
        .await?;
    Ok(Json(product))
}

#[tracing::instrument(skip(state))]
pub async fn update_price<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_id(&id, ProductId::from_uuid)?;
    let product = state
        .products
        .update_price(product_id, farmer_id, req.price_per_unit)
        .await?;
    Ok(Json(product))
}

#[tracing::instrument(skip(state))]
pub async fn update_status<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_id(&id, ProductId::from_uuid)?;
    let product = state
        .products
        .update_status(product_id, farmer_id, &req.status)
        .await?;
    Ok(Json(product))
}

/// PATCH /products/bulk/status: all listed products or none.
#[tracing::instrument(skip(state, req))]
pub async fn bulk_status<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Json(req): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, ApiError> {
    let updated = state
        .products
        .bulk_update_status(farmer_id, &req.product_ids, &req.status)
        .await?;
    Ok(Json(BulkStatusResponse { updated }))
}

#[tracing::instrument(skip(state))]
pub async fn duplicate<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product_id = parse_id(&id, ProductId::from_uuid)?;
    let copy = state.products.duplicate(product_id, farmer_id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

#[tracing::instrument(skip(state))]
pub async fn delete<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let product_id = parse_id(&id, ProductId::from_uuid)?;
    state.products.delete(product_id, farmer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state))]
pub async fn price_history<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProductPriceHistory>>, ApiError> {
    let product_id = parse_id(&id, ProductId::from_uuid)?;
    Ok(Json(state.products.price_history(product_id, farmer_id).await?))
}
