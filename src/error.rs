use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{message}")]
    RateLimitExceeded { message: String, retry_after_secs: u64 },

    #[error("{service}: {message}")]
    ExternalService { service: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Value of the `error` field in the response body
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::PayloadTooLarge(_) => "PayloadTooLargeError",
            AppError::RateLimitExceeded { .. } => "RateLimitError",
            AppError::ExternalService { .. } => "ExternalServiceError",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "Internal Server Error",
        }
    }

    pub fn database(context: &str, err: StoreError) -> Self {
        AppError::Database(format!("{context}: {err}"))
    }
}

/// JSON error body. Left in the response extensions so the request-id
/// middleware can stamp `requestId` before the response goes out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            status_code: status.as_u16(),
            request_id: None,
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        let mut response = (status, Json(self.clone())).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            // details stay in the log
            AppError::Internal(detail) => {
                error!(error = %detail, "Unhandled error");
                "An unexpected error occurred".to_string()
            }
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::PayloadTooLarge(_)
            | AppError::RateLimitExceeded { .. } => {
                warn!(kind = self.kind(), error = %self, "Request rejected");
                self.to_string()
            }
            _ => {
                error!(kind = self.kind(), error = %self, "Operational error");
                self.to_string()
            }
        };

        let mut response = ErrorBody::new(status, self.kind(), message).into_response_with(status);

        if let AppError::RateLimitExceeded { retry_after_secs, .. } = &self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        }

        response
    }
}
