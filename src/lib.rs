//! Response Cache - cache-aside response caching for axum services
//!
//! Derives a deterministic key per request, compresses large payloads, and
//! keeps a fail-safe connection to Redis so a cache outage only ever costs
//! latency, never correctness.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{ConnectionManager, ResponseCache};
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_reconnect_task};
