//! Closed enumerations used across the marketplace.
//!
//! Every enumeration round-trips through its snake_case string form, which is
//! also the representation stored in the database and sent over the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name a member of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All members, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError::new($kind, other)),
                }
            }
        }
    };
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Packed,
    OutForDelivery,
    Completed,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Packed => "packed",
    OutForDelivery => "out_for_delivery",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Statuses reachable in a single step from this one.
    pub fn allowed_targets(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Packed, Cancelled],
            Packed => &[OutForDelivery, Cancelled],
            OutForDelivery => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    /// Whether moving from `self` to `target` is an edge of the transition graph.
    ///
    /// A same-status request is not an edge; callers treat it as a detail
    /// update instead.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Accepted by the farmer but not yet delivered.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Packed | OrderStatus::OutForDelivery
        )
    }
}

/// Listing status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Sold,
    Draft,
    Expired,
}

string_enum!(ProductStatus, "product status", {
    Active => "active",
    Sold => "sold",
    Draft => "draft",
    Expired => "expired",
});

/// Dispute state layered on top of a completed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    #[default]
    None,
    Open,
    Resolved,
    Rejected,
}

string_enum!(DisputeStatus, "dispute status", {
    None => "none",
    Open => "open",
    Resolved => "resolved",
    Rejected => "rejected",
});

impl DisputeStatus {
    pub fn can_transition_to(&self, target: DisputeStatus) -> bool {
        matches!(
            (self, target),
            (DisputeStatus::None, DisputeStatus::Open)
                | (DisputeStatus::Open, DisputeStatus::Resolved)
                | (DisputeStatus::Open, DisputeStatus::Rejected)
        )
    }

    /// Resolved or rejected.
    pub fn is_closed(&self) -> bool {
        matches!(self, DisputeStatus::Resolved | DisputeStatus::Rejected)
    }
}

/// Why an order was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationType {
    BuyerRequest,
    StockIssue,
    LogisticsIssue,
    QualityIssue,
    Other,
}

string_enum!(CancellationType, "cancellation type", {
    BuyerRequest => "buyer_request",
    StockIssue => "stock_issue",
    LogisticsIssue => "logistics_issue",
    QualityIssue => "quality_issue",
    Other => "other",
});

/// Fixed three-hour delivery windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliverySlot {
    #[serde(rename = "06:00-09:00")]
    EarlyMorning,
    #[serde(rename = "09:00-12:00")]
    Morning,
    #[serde(rename = "12:00-15:00")]
    Afternoon,
    #[serde(rename = "15:00-18:00")]
    Evening,
}

string_enum!(DeliverySlot, "delivery slot", {
    EarlyMorning => "06:00-09:00",
    Morning => "09:00-12:00",
    Afternoon => "12:00-15:00",
    Evening => "15:00-18:00",
});

/// Account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Buyer,
}

string_enum!(UserRole, "role", {
    Farmer => "farmer",
    Buyer => "buyer",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_graph_matches_lifecycle() {
        use OrderStatus::*;
        let allowed = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Packed),
            (Confirmed, Cancelled),
            (Packed, OutForDelivery),
            (Packed, Cancelled),
            (OutForDelivery, Completed),
            (OutForDelivery, Cancelled),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = allowed.contains(&(*from, *to));
                assert_eq!(
                    from.can_transition_to(*to),
                    expected,
                    "{from} -> {to} should be {}",
                    if expected { "allowed" } else { "rejected" }
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_targets() {
        assert!(OrderStatus::Completed.allowed_targets().is_empty());
        assert!(OrderStatus::Cancelled.allowed_targets().is_empty());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn in_flight_statuses() {
        assert!(OrderStatus::Confirmed.is_in_flight());
        assert!(OrderStatus::Packed.is_in_flight());
        assert!(OrderStatus::OutForDelivery.is_in_flight());
        assert!(!OrderStatus::Pending.is_in_flight());
        assert!(!OrderStatus::Completed.is_in_flight());
    }

    #[test]
    fn dispute_graph() {
        use DisputeStatus::*;
        assert!(None.can_transition_to(Open));
        assert!(Open.can_transition_to(Resolved));
        assert!(Open.can_transition_to(Rejected));
        assert!(!None.can_transition_to(Resolved));
        assert!(!Resolved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn parse_trims_and_rejects_unknown() {
        assert_eq!(" packed ".parse::<OrderStatus>(), Ok(OrderStatus::Packed));
        assert_eq!(
            "out_for_delivery".parse::<OrderStatus>(),
            Ok(OrderStatus::OutForDelivery)
        );
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: shipped");
        assert!("Packed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn delivery_slots_use_window_labels() {
        assert_eq!(
            "12:00-15:00".parse::<DeliverySlot>(),
            Ok(DeliverySlot::Afternoon)
        );
        assert!("18:00-21:00".parse::<DeliverySlot>().is_err());
        let json = serde_json::to_string(&DeliverySlot::EarlyMorning).unwrap();
        assert_eq!(json, "\"06:00-09:00\"");
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&CancellationType::LogisticsIssue).unwrap();
        assert_eq!(json, "\"logistics_issue\"");
        let status: OrderStatus = serde_json::from_str("\"out_for_delivery\"").unwrap();
        assert_eq!(status, OrderStatus::OutForDelivery);
    }

    #[test]
    fn as_str_matches_display_for_every_member() {
        for s in OrderStatus::ALL {
            assert_eq!(s.to_string(), s.as_str());
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), *s);
        }
        for s in ProductStatus::ALL {
            assert_eq!(s.as_str().parse::<ProductStatus>().unwrap(), *s);
        }
        for s in UserRole::ALL {
            assert_eq!(s.as_str().parse::<UserRole>().unwrap(), *s);
        }
    }
}
