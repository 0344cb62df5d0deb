//! Request handlers.

pub mod health;
pub mod lists;
pub mod tree;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse an id path segment. Malformed ids cannot name anything, so they
/// are reported as not found.
pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{} {} not found", kind, raw)))
}
