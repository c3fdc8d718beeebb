//! JSON API envelopes and error mapping.
//!
//! Every non-stream endpoint responds with one of two envelopes:
//! `{ "success": true, "message": ..., "data": ... }` or
//! `{ "success": false, "error": { "message": ... } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// API-surface errors.
///
/// `NotFound` deliberately covers both "does not exist" and "not owned by
/// the caller" so the response does not leak which one it was.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("missing or invalid x-user-id header")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal error in request handler");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({
            "success": false,
            "error": { "message": self.to_string() },
        });

        (status, Json(body)).into_response()
    }
}

/// Build the success envelope around a serializable payload.
pub fn success<T: Serialize>(message: &str, data: T) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_400_envelope() {
        let response = ApiError::NotFound("Action not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_success_envelope_shape() {
        let Json(value) = success("ok", vec![1, 2, 3]);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "ok");
        assert_eq!(value["data"], json!([1, 2, 3]));
    }
}
