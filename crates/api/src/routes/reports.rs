//! Reporting endpoints backed by [`projections::ReportingService`].

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use common::OrderId;
use projections::{
    AnalyticsSummary, BuyerReviewItem, DisputeItem, FarmerReviewItem, Invoice, Notification,
    PayoutSummary, PeriodSummary,
};
use serde::Deserialize;
use store::MarketStore;

use super::parse_id;
use crate::AppState;
use crate::actor::{Buyer, Farmer};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "weekly".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(rename = "type", default = "default_report")]
    pub report_type: String,
}

fn default_report() -> String {
    "orders".to_string()
}

#[tracing::instrument(skip(state))]
pub async fn payout_summary<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
) -> Result<Json<PayoutSummary>, ApiError> {
    Ok(Json(state.reports.payout_summary(farmer_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn invoice<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let order_id = parse_id(&id, OrderId::from_uuid)?;
    Ok(Json(state.reports.invoice(order_id, farmer_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn analytics<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    Ok(Json(state.reports.analytics(farmer_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn farmer_notifications<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.reports.farmer_notifications(farmer_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn buyer_notifications<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.reports.buyer_notifications(buyer_id).await?))
}

/// GET /reports/summary?period=weekly|monthly
#[tracing::instrument(skip(state))]
pub async fn period_summary<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummary>, ApiError> {
    Ok(Json(
        state.reports.period_summary(farmer_id, &query.period).await?,
    ))
}

/// GET /reports/export?type=orders|payouts|disputes, served as a CSV attachment.
#[tracing::instrument(skip(state))]
pub async fn export<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .reports
        .csv_report(farmer_id, &query.report_type)
        .await?;
    let disposition = format!("attachment; filename=\"{}\"", report.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.body,
    ))
}

#[tracing::instrument(skip(state))]
pub async fn reviews_received<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
) -> Result<Json<Vec<FarmerReviewItem>>, ApiError> {
    Ok(Json(state.reports.farmer_reviews(farmer_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn reviews_written<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer_id): Buyer,
) -> Result<Json<Vec<BuyerReviewItem>>, ApiError> {
    Ok(Json(state.reports.buyer_reviews(buyer_id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn disputes<S: MarketStore + Clone>(
    State(state): State<Arc<AppState<S>>>,
    Farmer(farmer_id): Farmer,
) -> Result<Json<Vec<DisputeItem>>, ApiError> {
    Ok(Json(state.reports.farmer_disputes(farmer_id).await?))
}
