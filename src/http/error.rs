//! HTTP error responses.

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::SecondsFormat;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::ratelimit::Rejection;
use crate::upload::UploadError;

const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Errors returned by the API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The caller's quota for this category is exhausted
    #[error("{}", .0.message)]
    RateLimited(Rejection),

    /// The request body could not be read or parsed
    #[error("{message}")]
    Extract { status: StatusCode, message: String },

    /// A field failed validation
    #[error("{0}")]
    Invalid(String),

    /// A form was submitted with incomplete sections
    #[error("Form is incomplete")]
    Incomplete(serde_json::Value),

    /// The uploaded file was refused
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Extract { status, .. } => *status,
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::Incomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upload(UploadError::Empty) => StatusCode::BAD_REQUEST,
            ApiError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upload(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::Extract {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<axum::extract::rejection::BytesRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::BytesRejection) -> Self {
        ApiError::Extract {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::RateLimited(rejection) => rejection.into_response(),
            ApiError::Incomplete(sections) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "Form is incomplete",
                    "incompleteSections": sections,
                })),
            )
                .into_response(),
            other => (other.status(), Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        debug!(
            category = %self.category,
            retry_after_secs = self.retry_after_secs,
            "Rejecting rate limited request"
        );

        let reset = self.reset_at().to_rfc3339_opts(SecondsFormat::Millis, true);
        (
            StatusCode::TOO_MANY_REQUESTS,
            [
                (RETRY_AFTER, self.retry_after_secs.to_string()),
                (X_RATELIMIT_LIMIT, self.limit.to_string()),
                (X_RATELIMIT_REMAINING, "0".to_string()),
                (X_RATELIMIT_RESET, reset),
            ],
            Json(json!({
                "error": self.message,
                "retryAfter": self.retry_after_secs,
            })),
        )
            .into_response()
    }
}
