//! Payment processing, webhook, and synchronous verification endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use checkout::{
    MethodInfo, ProviderKind, ProviderSession, ReconcileError, ReconcileOutcome, SettlementClaim,
};
use common::OrderId;
use serde::{Deserialize, Serialize};
use store::CheckoutStore;

use crate::error::ApiError;

use super::{AppState, CurrentUser};

#[derive(Serialize)]
pub struct PaymentMethodsResponse {
    pub order_id: String,
    pub total_cents: i64,
    pub methods: Vec<MethodInfo>,
}

#[derive(Deserialize)]
pub struct StartPaymentRequest {
    pub method: String,
}

#[derive(Serialize)]
pub struct ReconcileResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

fn parse_kind(slug: &str) -> Result<ProviderKind, ApiError> {
    slug.parse::<ProviderKind>()
        .map_err(|err| ApiError::BadRequest(err.to_string()))
}

/// GET /payment/process/{order_id} — the enabled payment methods for an
/// unpaid order.
#[tracing::instrument(skip(state, user))]
pub async fn methods<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<PaymentMethodsResponse>, ApiError> {
    let order = state
        .store
        .get_order(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;

    if !order.owned_by(user.0) {
        return Err(ApiError::Checkout(checkout::CheckoutError::Forbidden));
    }
    if order.paid {
        return Err(ApiError::Checkout(checkout::CheckoutError::AlreadyPaid));
    }

    let methods = state.orchestrator.payment_methods()?;
    Ok(Json(PaymentMethodsResponse {
        order_id: order.id.to_string(),
        total_cents: order.total().cents(),
        methods,
    }))
}

/// POST /payment/process/{order_id} — initiate payment with the selected
/// method.
#[tracing::instrument(skip(state, user, req))]
pub async fn process<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(order_id): Path<OrderId>,
    Json(req): Json<StartPaymentRequest>,
) -> Result<Json<ProviderSession>, ApiError> {
    let kind = parse_kind(&req.method)?;
    let session = state
        .orchestrator
        .start_payment(order_id, kind, user.0)
        .await?;
    Ok(Json(session))
}

/// POST /payment/webhook/{provider} — asynchronous provider callback.
///
/// Status contract: 200 for every syntactically-handled delivery — no-op
/// events, unknown correlation ids, even our own storage failures — so the
/// provider stops retrying on problems retries cannot fix. 400 only for
/// signature failures and malformed payloads/unknown provider slugs.
#[tracing::instrument(skip(state, headers, body))]
pub async fn webhook<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Ok(kind) = provider.parse::<ProviderKind>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Some(header_name) = kind.signature_header() else {
        // Offline methods never deliver webhooks.
        return StatusCode::BAD_REQUEST.into_response();
    };
    let signature = headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match state.reconciler.reconcile_webhook(kind, &body, signature).await {
        Ok(outcome) => {
            let (status, order_id) = match outcome {
                ReconcileOutcome::Updated { order_id } => ("ok", Some(order_id.to_string())),
                ReconcileOutcome::AlreadyPaid { order_id } => ("ok", Some(order_id.to_string())),
                ReconcileOutcome::Ignored => ("ignored", None),
                ReconcileOutcome::OrderNotFound { .. } => ("unmatched", None),
            };
            (StatusCode::OK, Json(ReconcileResponse { status, order_id })).into_response()
        }
        Err(ReconcileError::Verification(_)) => StatusCode::BAD_REQUEST.into_response(),
        Err(err) => {
            // Our own failure: acknowledge anyway, the provider retrying
            // will not fix it, and the settlement is recoverable from logs.
            tracing::error!(error = %err, "webhook reconciliation failed");
            (
                StatusCode::OK,
                Json(ReconcileResponse {
                    status: "error",
                    order_id: None,
                }),
            )
                .into_response()
        }
    }
}

/// POST /payment/verify/{provider} — synchronous settlement verification
/// made by the client right after the provider SDK reports success.
#[tracing::instrument(skip(state, user, claim))]
pub async fn verify<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(provider): Path<String>,
    Json(claim): Json<SettlementClaim>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let kind = parse_kind(&provider)?;

    let outcome = state
        .reconciler
        .verify_settlement(kind, &claim, user.0)
        .await?;

    let (status, order_id) = match outcome {
        ReconcileOutcome::Updated { order_id } => ("success", Some(order_id.to_string())),
        ReconcileOutcome::AlreadyPaid { order_id } => ("success", Some(order_id.to_string())),
        ReconcileOutcome::Ignored | ReconcileOutcome::OrderNotFound { .. } => ("ignored", None),
    };

    Ok(Json(ReconcileResponse { status, order_id }))
}
