use crate::models::ValidationError;
use crate::store::StoreError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors a handler can return
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or query failed validation.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError::body(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(ValidationError::field("query", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => {
                warn!("Rejected request: {}", err);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "detail": {
                            "field": err.field,
                            "message": err.message,
                        }
                    })),
                )
                    .into_response()
            }
            ApiError::Store(StoreError::Unavailable(reason)) => {
                error!("Database not available: {}", reason);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Database not available" })),
                )
                    .into_response()
            }
            ApiError::Store(StoreError::Operation(reason)) => {
                error!("Database operation failed: {}", reason);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": reason })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_unprocessable() {
        let response =
            ApiError::from(ValidationError::field("polygon.type", "bad")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn store_failures_map_to_server_error() {
        let unavailable =
            ApiError::from(StoreError::Unavailable("down".to_string())).into_response();
        assert_eq!(unavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let rejected = ApiError::from(StoreError::Operation("bad loop".to_string())).into_response();
        assert_eq!(rejected.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
