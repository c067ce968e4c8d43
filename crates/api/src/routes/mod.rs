//! Route handlers and shared application state.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payment;
pub mod products;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use checkout::{CheckoutOrchestrator, LogNotifier, Reconciler};
use common::UserId;
use domain::Cart;
use store::CheckoutStore;
use tokio::sync::RwLock;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CheckoutStore> {
    pub store: Arc<S>,
    pub orchestrator: CheckoutOrchestrator<S>,
    pub reconciler: Reconciler<S, LogNotifier>,
    /// Session carts, keyed by user. Ephemeral by design: carts never
    /// outlive the process and are cleared on successful checkout.
    pub carts: RwLock<HashMap<UserId, Cart>>,
}

/// The authenticated user, taken from the `x-user-id` header.
///
/// Authentication itself is an upstream concern (gateway/middleware); by the
/// time a request reaches these handlers the header carries a trusted user
/// id. Handlers that require a user reject requests without one.
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<UserId>().ok())
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}
