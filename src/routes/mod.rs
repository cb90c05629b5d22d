use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    db::UserRepository,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::ProductService,
};

pub mod products;

/// Shared handler state
pub struct AppState {
    pub products: Arc<ProductService>,
    pub users: Arc<dyn UserRepository>,
    /// Serve the plain listing when the recommendation service fails
    pub fallback_to_listing: bool,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(products::list))
        .route("/products/:id", get(products::get_by_id))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
