//! Orders: reservation, the status state machine and reads.

mod audit;
mod commands;
mod details;
pub mod inventory;
mod service;

pub use audit::DISPUTE_UPDATE_REASON;
pub(crate) use audit::status_log;
pub use commands::{CreateOrder, UpdateOrderStatus};
pub use details::{OrderDetails, hydrate, hydrate_one};
pub use service::{DEFAULT_CANCELLATION_REASON, OrderService};
pub(crate) use service::check_dispute_step;
