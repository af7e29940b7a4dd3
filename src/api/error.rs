//! Maps workflow errors to HTTP responses.
//!
//! Every error body has the shape `{"msg": "..."}`. Server faults are logged
//! here and reported with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// Status code reported to HTTP clients for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::NoMatch { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Self::InvalidState { .. }
            | Self::Validation { .. }
            | Self::EmptyCart
            | Self::AlreadyCompleted { .. }
            | Self::AlreadyReviewed { .. } => StatusCode::BAD_REQUEST,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::ReceiptExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let msg = if self.is_server_fault() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "msg": msg }))).into_response()
    }
}
