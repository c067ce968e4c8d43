//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, ReconcileError, VerificationError};
use domain::CartError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Request carries no (or an unusable) authenticated user id.
    Unauthorized,
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout orchestration error.
    Checkout(CheckoutError),
    /// Reconciliation error (synchronous verification path).
    Reconcile(ReconcileError),
    /// Cart mutation error.
    Cart(CartError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "authentication required" }),
            ),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Reconcile(err) => reconcile_error_to_response(err),
            ApiError::Cart(err) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": err.to_string() }))
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": msg }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, serde_json::Value) {
    match &err {
        CheckoutError::InsufficientStock(shortages) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({
                "error": err.to_string(),
                "stock_errors": shortages,
            }),
        ),
        CheckoutError::EmptyCart => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": err.to_string() }),
        ),
        CheckoutError::ProductNotFound(_) | CheckoutError::OrderNotFound(_) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": err.to_string() }),
        ),
        CheckoutError::Forbidden => (
            StatusCode::FORBIDDEN,
            serde_json::json!({ "error": err.to_string() }),
        ),
        CheckoutError::AlreadyPaid => (
            StatusCode::CONFLICT,
            serde_json::json!({ "error": err.to_string() }),
        ),
        CheckoutError::NoProvidersEnabled | CheckoutError::ProviderUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": err.to_string() }),
        ),
        CheckoutError::Storage(source) => {
            tracing::error!(error = %source, "checkout storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "order could not be created" }),
            )
        }
        CheckoutError::Provider(source) => {
            tracing::error!(error = %source, "payment initiation failure");
            (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "payment could not be initiated" }),
            )
        }
    }
}

fn reconcile_error_to_response(err: ReconcileError) -> (StatusCode, serde_json::Value) {
    match &err {
        // Verification failures reveal nothing beyond the status.
        ReconcileError::Verification(VerificationError::InvalidSignature) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "payment verification failed" }),
        ),
        ReconcileError::Verification(_) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": err.to_string() }),
        ),
        ReconcileError::ProviderUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": err.to_string() }),
        ),
        ReconcileError::OrderNotFound(_) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": "order not found" }),
        ),
        ReconcileError::Forbidden => (
            StatusCode::FORBIDDEN,
            serde_json::json!({ "error": err.to_string() }),
        ),
        ReconcileError::Storage(source) => {
            tracing::error!(error = %source, "reconciliation storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "payment verification failed" }),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        ApiError::Reconcile(err)
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Cart(err)
    }
}
