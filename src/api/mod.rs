//! API Module
//!
//! HTTP handlers and routing for the news service.
//!
//! # Endpoints
//! - `GET /api/v1/news/category` - Articles by category, served through the cache
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod catalog;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
