//! Route handlers, one module per resource.

pub mod accounts;
pub mod cart;
pub mod orders;
pub mod products;
pub mod reports;
pub mod system;

use uuid::Uuid;

use crate::error::ApiError;

/// Parses a path segment into a typed id.
pub(crate) fn parse_id<T>(id: &str, from_uuid: fn(Uuid) -> T) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(id.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(from_uuid(uuid))
}
