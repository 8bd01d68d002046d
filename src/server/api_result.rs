use crate::errors::ApiError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// The stable error envelope from spec §7: `error` is the branchable token,
/// `message` is the human-readable detail.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let report = ErrorReport { error: self.token(), message: self.to_string() };

        if status.is_server_error() {
            error!(error = ?self, token = self.token(), "request failed");
        } else {
            warn!(error = ?self, token = self.token(), "request rejected");
        }

        (status, Json(report)).into_response()
    }
}

impl From<axum::extract::rejection::PathRejection> for ApiError {
    fn from(error: axum::extract::rejection::PathRejection) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(error: axum::extract::rejection::JsonRejection) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<axum::extract::rejection::QueryRejection> for ApiError {
    fn from(error: axum::extract::rejection::QueryRejection) -> Self {
        Self::Validation(error.to_string())
    }
}
