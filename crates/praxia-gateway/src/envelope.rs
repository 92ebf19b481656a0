//! Wire shape for pipeline denials.
//!
//! Every failure leaves the gateway as the same JSON envelope:
//! `{"error": {"code", "message"}}`, with a `meta` block on quota
//! denials. Clients match on `error.code`, never on message text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use praxia_common::AccessError;

/// Handler result type; denials render through [`ApiError`]
pub type ApiResult<T> = Result<T, ApiError>;

/// Newtype bridging the pipeline taxonomy onto HTTP responses
pub struct ApiError(pub AccessError);

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal detail stays in the log; the wire gets the opaque
        // envelope only.
        if let AccessError::Internal(detail) = &self.0 {
            tracing::error!(detail, "request failed on infrastructure");
        }

        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_envelope())).into_response()
    }
}
