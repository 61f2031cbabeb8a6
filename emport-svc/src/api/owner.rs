//! Request owner extraction
//!
//! Authentication happens upstream; the authenticated identity arrives in the
//! `x-emport-user` header and scopes every import call.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::fmt;

use crate::error::ApiError;

/// Header carrying the owner identity
pub const OWNER_HEADER: &str = "x-emport-user";

/// Identity an import task is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .ok_or_else(|| ApiError::BadRequest(format!("Missing {} header", OWNER_HEADER)))?;
        let owner = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} header is not valid text", OWNER_HEADER)))?
            .trim();
        if owner.is_empty() {
            return Err(ApiError::BadRequest(format!("{} header is empty", OWNER_HEADER)));
        }
        Ok(Owner(owner.to_string()))
    }
}
