//! Reporting for the farm marketplace.
//!
//! Reports are projections computed on demand from committed orders,
//! products and reviews:
//! - payout summaries and per-order invoices
//! - sales analytics and rolling period summaries
//! - derived notifications for farmers and buyers
//! - CSV exports and review/dispute listings
//!
//! The [`views`] module holds the pure computations; [`ReportingService`]
//! loads rows from a [`store::MarketStore`] and feeds them through.

pub mod error;
pub mod service;
pub mod views;

pub use error::{ProjectionError, Result};
pub use service::{CsvReport, ReportingService};
pub use views::{
    AnalyticsSummary, BuyerReviewItem, DisputeItem, FarmerReviewItem, Invoice, Notification,
    NotificationKind, PayoutSummary, Period, PeriodSummary, Priority, ReportType, TopProduct,
};
