//! Order creation and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::OrderId;
use domain::{Order, ShippingInfo};
use serde::{Deserialize, Serialize};
use store::CheckoutStore;

use crate::error::ApiError;

use super::{AppState, CurrentUser};

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub total_cents: i64,
    /// Where the client goes next: method selection and initiation.
    pub payment_url: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub paid: bool,
    pub payment_intent_id: Option<String>,
    pub provider_reference: Option<String>,
    pub created_at: String,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            paid: order.paid,
            payment_intent_id: order.payment_intent_id.clone(),
            provider_reference: order.provider_reference.clone(),
            created_at: order.created_at.to_rfc3339(),
            total_cents: order.total().cents(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    line_total_cents: item.line_total().cents(),
                })
                .collect(),
        }
    }
}

/// POST /orders — create an order from the session cart.
///
/// Runs the checkout orchestrator: all-lines stock validation, atomic
/// creation with inventory reservation, then cart clearing. The response
/// points the client at the payment processing page.
#[tracing::instrument(skip(state, user, req))]
pub async fn create<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let shipping = ShippingInfo {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        address: req.address,
        postal_code: req.postal_code,
        city: req.city,
    };

    let mut carts = state.carts.write().await;
    let cart = carts.entry(user.0).or_default();

    let order = state
        .orchestrator
        .create_order(cart, shipping, user.0)
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: order.id.to_string(),
            total_cents: order.total().cents(),
            payment_url: format!("/payment/process/{}", order.id),
        }),
    ))
}

/// GET /orders/{id} — load an order. Owner only.
#[tracing::instrument(skip(state, user))]
pub async fn get<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .store
        .get_order(id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    if !order.owned_by(user.0) {
        return Err(ApiError::Checkout(checkout::CheckoutError::Forbidden));
    }

    Ok(Json(order.into()))
}
