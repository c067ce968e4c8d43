//! HTTP API server with observability for the storefront checkout.
//!
//! Exposes the cart, order, and payment endpoints over a `CheckoutStore`,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use checkout::{
    CheckoutOrchestrator, LogNotifier, PaymentConfig, ProviderRegistry, Reconciler,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::CheckoutStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CheckoutStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::products::list::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart/items", post(routes::cart::upsert_line::<S>))
        .route(
            "/cart/items/{product_id}",
            delete(routes::cart::remove_line::<S>),
        )
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/payment/process/{order_id}",
            get(routes::payment::methods::<S>),
        )
        .route(
            "/payment/process/{order_id}",
            post(routes::payment::process::<S>),
        )
        .route(
            "/payment/webhook/{provider}",
            post(routes::payment::webhook::<S>),
        )
        .route(
            "/payment/verify/{provider}",
            post(routes::payment::verify::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state: orchestrator and reconciler over the
/// store, with the configuration-enabled provider set.
pub fn create_default_state<S: CheckoutStore + 'static>(
    store: S,
    payment: &PaymentConfig,
) -> Arc<AppState<S>> {
    let store = Arc::new(store);
    let registry = Arc::new(ProviderRegistry::from_config(payment));

    Arc::new(AppState {
        store: store.clone(),
        orchestrator: CheckoutOrchestrator::new(store.clone(), registry.clone()),
        reconciler: Reconciler::new(store, registry, LogNotifier::new()),
        carts: tokio::sync::RwLock::new(std::collections::HashMap::new()),
    })
}
