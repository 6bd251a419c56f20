//! Request and Response models for the news API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::CategoryQuery;
pub use responses::{
    Article, CategoryResponse, ErrorResponse, HealthResponse, ListingMeta, StatsResponse,
};
