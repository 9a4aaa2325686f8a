use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use artrace_core::error::AccessError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type. Access
/// service errors convert via `From<AccessError>` and keep their
/// distinguishable codes on the wire.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("free trial already used")]
    TrialAlreadyUsed,

    /// Gateway rejected the initiation call; provider text stays in logs.
    #[error("payment initiation failed")]
    PaymentInitiationFailed(String),

    #[error("payment not completed")]
    PaymentNotCompleted,

    #[error("payment gateway timed out")]
    PaymentGatewayTimeout,

    #[error("rate limited")]
    RateLimited { retry_after_seconds: u64 },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Validation(msg) => AppError::BadRequest(msg),
            AccessError::TrialAlreadyUsed => AppError::TrialAlreadyUsed,
            AccessError::PaymentInitiationFailed(detail) => {
                AppError::PaymentInitiationFailed(detail)
            }
            AccessError::PaymentNotCompleted => AppError::PaymentNotCompleted,
            AccessError::PaymentGatewayTimeout => AppError::PaymentGatewayTimeout,
            AccessError::NotFound(what) => AppError::NotFound(what),
            AccessError::Store(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retry_after_seconds) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
                None,
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
                None,
            ),
            AppError::TrialAlreadyUsed => (
                StatusCode::BAD_REQUEST,
                "trial_already_used",
                "Free trial already used".to_string(),
                None,
            ),
            AppError::PaymentInitiationFailed(detail) => {
                tracing::warn!(detail = %detail, "Payment initiation rejected by gateway");
                (
                    StatusCode::BAD_GATEWAY,
                    "payment_init_failed",
                    "Payment could not be initiated".to_string(),
                    None,
                )
            }
            AppError::PaymentNotCompleted => (
                StatusCode::BAD_REQUEST,
                "payment_not_completed",
                "Payment was not completed".to_string(),
                None,
            ),
            AppError::PaymentGatewayTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "payment_gateway_timeout",
                "Payment gateway timed out".to_string(),
                None,
            ),
            AppError::RateLimited {
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded".to_string(),
                Some(*retry_after_seconds),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let mut response = (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            })),
        )
            .into_response();

        if let Some(retry_after_seconds) = retry_after_seconds {
            if let Ok(value) = retry_after_seconds.to_string().parse() {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, value);
            }
        }

        response
    }
}
