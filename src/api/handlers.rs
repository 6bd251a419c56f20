//! API Handlers
//!
//! HTTP request handlers for the news service and its cache diagnostics.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::catalog;
use crate::cache::{ConnectionManager, ResponseCache};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{CategoryQuery, CategoryResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// The response cache is constructed once at startup and handed to the
/// router; nothing reaches it through globals.
#[derive(Clone)]
pub struct AppState {
    pub cache: ResponseCache,
}

impl AppState {
    pub fn new(cache: ResponseCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration around an initialized manager.
    pub fn from_config(manager: Arc<ConnectionManager>, config: &Config) -> Self {
        Self::new(ResponseCache::from_config(manager, config))
    }
}

/// Handler for GET /api/v1/news/category
///
/// Lists articles in a category. Wrapped by the cache middleware in the router.
pub async fn category_handler(
    Query(query): Query<CategoryQuery>,
) -> Result<Json<CategoryResponse>> {
    let (category, limit) = query.validate().map_err(ApiError::InvalidRequest)?;
    let articles = catalog::articles_for(category, limit);

    Ok(Json(CategoryResponse::new(articles)))
}

/// Handler for GET /stats
///
/// Returns cache counters and the current connection state.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let manager = state.cache.manager();
    Json(StatsResponse::new(manager.state(), manager.stats().snapshot()))
}

/// Handler for GET /health
///
/// The service stays healthy while the cache is down; the cache state is
/// reported alongside.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.manager().state()))
}
