//! Minimal catalog surface: listing for storefront pages, insertion for
//! seeding. Full catalog management lives outside this service.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::Money;
use domain::Product;
use serde::{Deserialize, Serialize};
use store::CheckoutStore;

use crate::error::ApiError;

use super::AppState;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub unit_price_cents: i64,
    pub stock: u32,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub stock: u32,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            unit_price_cents: product.unit_price.cents(),
            stock: product.stock,
        }
    }
}

/// GET /products — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .store
        .list_products()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// POST /products — insert a product (seeding surface).
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CheckoutStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductResponse>), ApiError> {
    if req.unit_price_cents <= 0 {
        return Err(ApiError::BadRequest(
            "unit_price_cents must be positive".to_string(),
        ));
    }

    let product = Product::new(req.name, Money::from_cents(req.unit_price_cents), req.stock);
    state
        .store
        .insert_product(product.clone())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((axum::http::StatusCode::CREATED, Json(product.into())))
}
