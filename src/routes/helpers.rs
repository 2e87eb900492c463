//! Shared helper functions for Rocket route handlers.

use uuid::Uuid;

use crate::error::ApiError;
use crate::threading::ItemId;

/// Parse a record identifier taken from the request path.
///
/// Returns [`ApiError::BadRequest`] when the value is not a UUID.
pub fn parse_record_id(value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("'{value}' is not a valid record id")))
}

pub fn parse_item(value: &str) -> Result<ItemId, ApiError> {
    Ok(ItemId::new(value)?)
}
