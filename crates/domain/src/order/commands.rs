//! Order commands.

use common::{ProductId, Quantity};
use serde::Deserialize;

/// Command to buy a product directly, outside the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(default)]
    pub delivery_address: String,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(product_id: ProductId, quantity: impl Into<Quantity>) -> Self {
        Self {
            product_id,
            quantity: quantity.into(),
            delivery_address: String::new(),
        }
    }

    pub fn deliver_to(mut self, address: impl Into<String>) -> Self {
        self.delivery_address = address.into();
        self
    }
}

/// Request to move an order to `status` and/or update its delivery,
/// cancellation or dispute details.
///
/// Enumerated fields arrive as raw strings and are validated by the order
/// service; blank optional fields are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateOrderStatus {
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub cancellation_type: Option<String>,
    pub cancellation_note: Option<String>,
    pub delivery_date: Option<String>,
    pub delivery_slot: Option<String>,
    pub dispute_status: Option<String>,
    pub dispute_note: Option<String>,
}

impl UpdateOrderStatus {
    /// Creates a request targeting `status` with no detail changes.
    pub fn to(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn with_cancellation(
        mut self,
        cancellation_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.cancellation_type = Some(cancellation_type.into());
        self.cancellation_reason = Some(reason.into());
        self
    }

    pub fn with_cancellation_note(mut self, note: impl Into<String>) -> Self {
        self.cancellation_note = Some(note.into());
        self
    }

    pub fn with_delivery(mut self, date: Option<String>, slot: Option<String>) -> Self {
        self.delivery_date = date;
        self.delivery_slot = slot;
        self
    }

    pub fn with_dispute(mut self, status: impl Into<String>, note: impl Into<String>) -> Self {
        self.dispute_status = Some(status.into());
        self.dispute_note = Some(note.into());
        self
    }
}
