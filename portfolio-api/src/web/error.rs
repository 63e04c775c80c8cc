//! API error taxonomy and its HTTP mapping.
//!
//! Every variant carries the message shown to the caller. Underlying causes
//! are logged where they happen and never reach the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Caller exceeded the endpoint quota
    #[error("{0}")]
    RateLimited(&'static str),

    /// Body failed decoding or validation
    #[error("{0}")]
    InvalidInput(String),

    /// Body exceeded the configured size limit
    #[error("{0}")]
    PayloadTooLarge(&'static str),

    /// A required collaborator credential is missing
    #[error("{0}")]
    NotConfigured(&'static str),

    /// The mail or chat service failed
    #[error("{0}")]
    Upstream(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotConfigured(_) | ApiError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
