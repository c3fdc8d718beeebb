//! Caller identity extractor.
//!
//! Identity arrives as an `x-user-id` header set by the fronting auth layer
//! (token exchange itself is not this service's concern). Missing or
//! malformed headers reject with a 401 envelope.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::common::{ApiError, UserId};

/// Authenticated user information for one request.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let user_id = UserId::parse(raw).map_err(|_| ApiError::Unauthorized)?;
        Ok(AuthUser { user_id })
    }
}
