//! Session cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::{PricedLine, UpsertMode};
use serde::{Deserialize, Serialize};
use store::CheckoutStore;

use crate::error::ApiError;

use super::{AppState, CurrentUser};

#[derive(Deserialize)]
pub struct UpsertLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Explicit intent: `"add"` accumulates, `"replace"` overwrites.
    pub mode: UpsertMode,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: Option<i64>,
    pub line_total_cents: Option<i64>,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub total_cents: i64,
}

async fn cart_view<S: CheckoutStore>(
    state: &AppState<S>,
    user_id: common::UserId,
) -> Result<CartResponse, ApiError> {
    let carts = state.carts.read().await;
    let Some(cart) = carts.get(&user_id) else {
        return Ok(CartResponse {
            lines: Vec::new(),
            total_cents: 0,
        });
    };

    let mut lines = Vec::with_capacity(cart.line_count());
    let mut total_cents = 0;
    for line in cart.lines() {
        let product = state
            .store
            .get_product(line.product_id)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        match product {
            Some(product) => {
                let priced = PricedLine::price(*line, &product);
                let unit_price_cents = priced.unit_price.cents();
                let line_total_cents = priced.line_total().cents();
                total_cents += line_total_cents;
                lines.push(CartLineResponse {
                    product_id: line.product_id.to_string(),
                    product_name: Some(priced.product_name),
                    quantity: line.quantity,
                    unit_price_cents: Some(unit_price_cents),
                    line_total_cents: Some(line_total_cents),
                });
            }
            // The product vanished from the catalog after it was added;
            // show the line so the user can remove it.
            None => lines.push(CartLineResponse {
                product_id: line.product_id.to_string(),
                product_name: None,
                quantity: line.quantity,
                unit_price_cents: None,
                line_total_cents: None,
            }),
        }
    }

    Ok(CartResponse { lines, total_cents })
}

/// GET /cart — the session cart priced against the live catalog.
#[tracing::instrument(skip(state, user))]
pub async fn get<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    Ok(Json(cart_view(&state, user.0).await?))
}

/// POST /cart/items — insert or update a cart line with explicit add/replace
/// intent.
#[tracing::instrument(skip(state, user, req))]
pub async fn upsert_line<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Json(req): Json<UpsertLineRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product = state
        .store
        .get_product(req.product_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("product {} not found", req.product_id)))?;

    // Advisory stock check for a friendly early error; the checkout commit
    // re-validates under the transaction either way.
    if !product.can_supply(req.quantity) {
        return Err(ApiError::BadRequest(format!(
            "only {} of {} available",
            product.stock, product.name
        )));
    }

    {
        let mut carts = state.carts.write().await;
        let cart = carts.entry(user.0).or_default();
        cart.upsert_line(req.product_id, req.quantity, req.mode)?;
    }

    tracing::info!(user_id = %user.0, product_id = %req.product_id, quantity = req.quantity, "cart updated");
    Ok(Json(cart_view(&state, user.0).await?))
}

/// DELETE /cart/items/{product_id} — remove a line.
#[tracing::instrument(skip(state, user))]
pub async fn remove_line<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartResponse>, ApiError> {
    {
        let mut carts = state.carts.write().await;
        let cart = carts.entry(user.0).or_default();
        cart.remove_line(product_id)?;
    }

    Ok(Json(cart_view(&state, user.0).await?))
}
