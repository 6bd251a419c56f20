//! API Routes
//!
//! Configures the Axum router; content routes are wrapped by the cache layer.

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{category_handler, health_handler, stats_handler, AppState};
use crate::cache::cache_response;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/v1/news/category` - Articles by category (cached)
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cached = middleware::from_fn_with_state(state.cache.clone(), cache_response);

    Router::new()
        .route("/api/v1/news/category", get(category_handler).layer(cached))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
