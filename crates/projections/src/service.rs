//! Reporting service: loads committed rows and runs the pure views over them.

use chrono::Utc;
use common::{OrderId, Review, UserId};
use domain::{DomainError, OrderDetails, hydrate, hydrate_one};
use serde::Serialize;
use store::MarketStore;

use crate::error::Result;
use crate::views::{
    self, AnalyticsSummary, BuyerReviewItem, DisputeItem, FarmerReviewItem, Invoice, Notification,
    Period, PeriodSummary, PayoutSummary, ReportType,
};

/// A rendered CSV export and the file name to serve it under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvReport {
    pub filename: String,
    pub body: String,
}

/// Read-only reports for farmers and buyers.
///
/// Every report reflects committed state at the time of the call and uses
/// the current UTC time as its reference point.
pub struct ReportingService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> ReportingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn farmer_orders(&self, farmer_id: UserId) -> Result<Vec<OrderDetails>> {
        let orders = self.store.list_orders_by_farmer(farmer_id).await?;
        Ok(hydrate(&self.store, orders).await?)
    }

    async fn orders_for_reviews(&self, reviews: &[Review]) -> Result<Vec<OrderDetails>> {
        let mut orders = Vec::with_capacity(reviews.len());
        for review in reviews {
            if let Some(order) = self.store.get_order(review.order_id).await? {
                orders.push(order);
            }
        }
        Ok(hydrate(&self.store, orders).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn payout_summary(&self, farmer_id: UserId) -> Result<PayoutSummary> {
        let orders = self.store.list_orders_by_farmer(farmer_id).await?;
        Ok(views::payout_summary(&orders))
    }

    /// Invoice for one of the farmer's own orders.
    #[tracing::instrument(skip(self))]
    pub async fn invoice(&self, order_id: OrderId, farmer_id: UserId) -> Result<Invoice> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::NotFound("order"))?;
        if !order.is_farmer(farmer_id) {
            return Err(DomainError::Unauthorized("you can only access your own invoices").into());
        }
        let details = hydrate_one(&self.store, order).await?;
        Ok(views::invoice(&details))
    }

    #[tracing::instrument(skip(self))]
    pub async fn analytics(&self, farmer_id: UserId) -> Result<AnalyticsSummary> {
        let orders = self.farmer_orders(farmer_id).await?;
        Ok(views::analytics(&orders, Utc::now()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn farmer_notifications(&self, farmer_id: UserId) -> Result<Vec<Notification>> {
        let orders = self.store.list_orders_by_farmer(farmer_id).await?;
        let products = self.store.list_products_by_farmer(farmer_id).await?;
        Ok(views::farmer_notifications(&orders, &products, Utc::now()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn buyer_notifications(&self, buyer_id: UserId) -> Result<Vec<Notification>> {
        let orders = self.store.list_orders_by_buyer(buyer_id).await?;
        let orders = hydrate(&self.store, orders).await?;
        Ok(views::buyer_notifications(&orders, Utc::now()))
    }

    /// Summary over the trailing week or month; `period` is `weekly` or `monthly`.
    #[tracing::instrument(skip(self))]
    pub async fn period_summary(&self, farmer_id: UserId, period: &str) -> Result<PeriodSummary> {
        let period: Period = period.parse()?;
        let orders = self.store.list_orders_by_farmer(farmer_id).await?;
        Ok(views::period_summary(&orders, period, Utc::now()))
    }

    /// CSV export; `report_type` is `orders`, `payouts` or `disputes`.
    #[tracing::instrument(skip(self))]
    pub async fn csv_report(&self, farmer_id: UserId, report_type: &str) -> Result<CsvReport> {
        let report_type: ReportType = report_type.parse()?;
        let orders = self.farmer_orders(farmer_id).await?;
        let body = views::render_csv(&orders, report_type)?;
        tracing::debug!(rows = orders.len(), report = report_type.as_str(), "csv report rendered");
        Ok(CsvReport {
            filename: views::report_filename(report_type, Utc::now()),
            body,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn farmer_reviews(&self, farmer_id: UserId) -> Result<Vec<FarmerReviewItem>> {
        let reviews = self.store.list_reviews_by_reviewee(farmer_id).await?;
        let orders = self.orders_for_reviews(&reviews).await?;
        Ok(FarmerReviewItem::list(&reviews, &orders))
    }

    #[tracing::instrument(skip(self))]
    pub async fn buyer_reviews(&self, buyer_id: UserId) -> Result<Vec<BuyerReviewItem>> {
        let reviews = self.store.list_reviews_by_reviewer(buyer_id).await?;
        let orders = self.orders_for_reviews(&reviews).await?;
        Ok(BuyerReviewItem::list(&reviews, &orders))
    }

    #[tracing::instrument(skip(self))]
    pub async fn farmer_disputes(&self, farmer_id: UserId) -> Result<Vec<DisputeItem>> {
        let orders = self.farmer_orders(farmer_id).await?;
        Ok(views::dispute_items(&orders))
    }
}
