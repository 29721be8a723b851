//! Domain error types.

use common::{OrderStatus, ProductId, Quantity};
use store::StoreError;
use thiserror::Error;

/// Coarse classification of a failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The addressed entity does not exist.
    NotFound,
    /// The actor is not a party to the entity.
    Unauthorized,
    /// Malformed or out-of-range input.
    Validation,
    /// The request conflicts with the current state.
    Conflict,
    /// Persistence failure or other unexpected error.
    Internal,
}

/// Errors that can occur during domain operations.
///
/// Display strings are the user-visible messages; each one names the
/// precondition that failed.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("invalid status transition")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("product is not available")]
    ProductUnavailable(ProductId),

    #[error("insufficient quantity available")]
    InsufficientStock {
        product_id: ProductId,
        available: Quantity,
        requested: Quantity,
    },

    #[error("you cannot order your own product")]
    OwnProduct,

    #[error("cannot cancel completed order")]
    CannotCancelCompleted,

    #[error("dispute can only be opened for completed orders")]
    DisputeRequiresCompletedOrder,

    #[error("dispute already exists for this order")]
    DisputeAlreadyExists,

    #[error("only open disputes can be updated")]
    DisputeNotOpen,

    #[error("only completed orders can be reviewed")]
    ReviewRequiresCompletedOrder,

    #[error("review already submitted for this order")]
    ReviewAlreadySubmitted,

    #[error("cart is empty")]
    CartEmpty,

    #[error("{0} already registered")]
    AlreadyRegistered(&'static str),

    #[error("requested quantity exceeds available stock")]
    CartExceedsStock,

    #[error("{0}")]
    ProductStatusConflict(&'static str),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Unauthorized(_) => ErrorKind::Unauthorized,
            DomainError::Validation(_) | DomainError::OwnProduct | DomainError::CartEmpty => {
                ErrorKind::Validation
            }
            DomainError::InvalidTransition { .. }
            | DomainError::ProductUnavailable(_)
            | DomainError::InsufficientStock { .. }
            | DomainError::CannotCancelCompleted
            | DomainError::DisputeRequiresCompletedOrder
            | DomainError::DisputeAlreadyExists
            | DomainError::DisputeNotOpen
            | DomainError::ReviewRequiresCompletedOrder
            | DomainError::ReviewAlreadySubmitted
            | DomainError::AlreadyRegistered(_)
            | DomainError::CartExceedsStock
            | DomainError::ProductStatusConflict(_) => ErrorKind::Conflict,
            DomainError::Store(e) if e.is_unique_violation() => ErrorKind::Conflict,
            DomainError::Store(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
