//! Response DTOs for the news API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::cache::{ConnectionState, StatsSnapshot};

/// A single article in a category listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub category: String,
    pub summary: String,
}

/// Listing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingMeta {
    /// Articles are machine-written
    pub generated: bool,
    pub count: usize,
}

/// Response body for `GET /api/v1/news/category`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub meta: ListingMeta,
    pub articles: Vec<Article>,
}

impl CategoryResponse {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            meta: ListingMeta {
                generated: true,
                count: articles.len(),
            },
            articles,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Whether the cache store is currently reachable
    pub connected: bool,
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(state: ConnectionState, counters: StatsSnapshot) -> Self {
        Self {
            connected: state == ConnectionState::Connected,
            hit_rate: counters.hit_rate(),
            counters,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status; always "healthy" since the cache is optional
    pub status: String,
    /// "connected" or "disconnected"
    pub cache: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(state: ConnectionState) -> Self {
        let cache = match state {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        };
        Self {
            status: "healthy".to_string(),
            cache: cache.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_response_counts_articles() {
        let article = Article {
            id: "technology-1".to_string(),
            title: "t".to_string(),
            category: "Technology".to_string(),
            summary: "s".to_string(),
        };
        let resp = CategoryResponse::new(vec![article.clone(), article]);
        assert_eq!(resp.meta.count, 2);
        assert!(resp.meta.generated);
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let counters = StatsSnapshot {
            hits: 3,
            misses: 1,
            ..StatsSnapshot::default()
        };
        let resp = StatsResponse::new(ConnectionState::Connected, counters);
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["hits"], 3);
        assert_eq!(json["connected"], true);
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(ConnectionState::Disconnected);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("disconnected"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
