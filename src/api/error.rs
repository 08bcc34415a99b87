//! API error type and its HTTP response mapping

use crate::exchange::ExchangeError;
use crate::feed::FeedError;
use crate::offset::OffsetError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream exchange error: {0}")]
    Upstream(#[from] ExchangeError),

    #[error("Offset store error: {0}")]
    Storage(#[from] OffsetError),
}

impl From<FeedError> for ApiError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::Exchange(e) => ApiError::Upstream(e),
            FeedError::Offset(e) => ApiError::Storage(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "BAD_REQUEST"),
            ApiError::Upstream(e) => {
                tracing::warn!(error = %e, "Exchange request failed");
                (StatusCode::BAD_GATEWAY, e.to_string(), "UPSTREAM_ERROR")
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "Offset store failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": message
        }));

        (status, body).into_response()
    }
}
