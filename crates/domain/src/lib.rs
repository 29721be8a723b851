//! Marketplace business rules.
//!
//! Services here own every invariant of the order lifecycle:
//! - [`OrderService`]: direct purchase, the status state machine, order reads
//! - [`DisputeService`] and [`ReviewService`]: post-completion actions
//! - [`ProductService`] and [`AccountService`]: listings and accounts
//!
//! Each mutation runs inside one [`store::UnitOfWork`], so stock, orders and
//! audit rows change together or not at all.

pub mod account;
pub mod dispute;
pub mod error;
pub mod notifier;
pub mod order;
pub mod product;
pub mod review;
pub mod validation;

pub use account::{AccountService, RegisterAccount};
pub use dispute::DisputeService;
pub use error::{DomainError, ErrorKind, Result};
pub use notifier::{ChannelNotifier, NoopNotifier, NotifyError, OrderNotification, OrderNotifier};
pub use order::{
    CreateOrder, DEFAULT_CANCELLATION_REASON, DISPUTE_UPDATE_REASON, OrderDetails, OrderService,
    UpdateOrderStatus, hydrate, hydrate_one,
};
pub use product::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, ProductDraft, ProductService};
pub use review::{ReviewService, SubmitReview};
