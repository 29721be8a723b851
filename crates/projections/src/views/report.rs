//! CSV exports of a farmer's orders.

use chrono::{DateTime, SecondsFormat, Utc};
use common::DisputeStatus;
use domain::OrderDetails;
use serde::Serialize;

use super::payout::split_gross;
use crate::error::{ProjectionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Orders,
    Payouts,
    Disputes,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Orders => "orders",
            ReportType::Payouts => "payouts",
            ReportType::Disputes => "disputes",
        }
    }

    fn header(&self) -> &'static [&'static str] {
        match self {
            ReportType::Orders => &[
                "order_id", "date", "buyer", "product", "quantity", "unit", "status", "total_inr",
            ],
            ReportType::Payouts => &["order_id", "date", "status", "gross_inr", "fee_inr", "net_inr"],
            ReportType::Disputes => &[
                "order_id",
                "date",
                "buyer",
                "product",
                "dispute_status",
                "dispute_note",
            ],
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = ProjectionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "orders" => Ok(ReportType::Orders),
            "payouts" => Ok(ReportType::Payouts),
            "disputes" => Ok(ReportType::Disputes),
            other => Err(ProjectionError::InvalidReportType(other.to_string())),
        }
    }
}

/// `farmer_<type>_report_<YYYYMMDD_HHMMSS>.csv` in UTC.
pub fn report_filename(report_type: ReportType, now: DateTime<Utc>) -> String {
    format!(
        "farmer_{}_report_{}.csv",
        report_type.as_str(),
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Renders one row per order (disputes: per disputed order) under a fixed header.
pub fn render_csv(orders: &[OrderDetails], report_type: ReportType) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(report_type.header())?;

    for details in orders {
        let order = &details.order;
        let id = order.id.to_string();
        let date = order.created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let product = details
            .product
            .as_ref()
            .map(|p| p.crop_name.as_str())
            .unwrap_or_default();

        match report_type {
            ReportType::Orders => {
                let quantity = format!("{:.2}", order.quantity.value());
                let total = order.total_price.to_fixed();
                writer.write_record([
                    id.as_str(),
                    date.as_str(),
                    details.buyer_name(),
                    product,
                    quantity.as_str(),
                    details.unit(),
                    order.status.as_str(),
                    total.as_str(),
                ])?;
            }
            ReportType::Payouts => {
                let (fee, net) = split_gross(order.total_price);
                writer.write_record([
                    id.as_str(),
                    date.as_str(),
                    order.status.as_str(),
                    order.total_price.to_fixed().as_str(),
                    fee.to_fixed().as_str(),
                    net.to_fixed().as_str(),
                ])?;
            }
            ReportType::Disputes => {
                if order.dispute_status == DisputeStatus::None {
                    continue;
                }
                writer.write_record([
                    id.as_str(),
                    date.as_str(),
                    details.buyer_name(),
                    product,
                    order.dispute_status.as_str(),
                    order.dispute_note.as_deref().unwrap_or_default(),
                ])?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ProjectionError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ProjectionError::Encoding(e.to_string()))
}
