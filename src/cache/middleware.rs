//! Cache-Aside Middleware
//!
//! Per-request protocol: derive the key, look it up, serve a decoded hit, or
//! run the wrapped handler and store its body when it answered `200 OK`.
//! Every cache fault is absorbed here; the handler alone decides whether a
//! request succeeds.
//!
//! [`ResponseCache::serve`] implements the protocol for any handler output,
//! and [`cache_response`] plugs it into an axum router:
//!
//! ```ignore
//! let route = get(handler).layer(middleware::from_fn_with_state(cache, cache_response));
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{OriginalUri, Query, Request, State},
    http::{header, response::Parts, HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::cache::{codec, CacheKey, ConnectionManager};
use crate::config::{Config, MAX_TTL_SECONDS};

/// Response header reporting how the cache handled a request.
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Default cap on response bodies buffered for caching.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// == Handler Output ==
/// What the middleware needs to know about a handler's result.
pub trait HandlerOutput {
    /// Whether the response may be cached.
    fn is_success(&self) -> bool;

    /// Serialized body to store.
    fn body(&self) -> &[u8];
}

impl HandlerOutput for (StatusCode, Bytes) {
    fn is_success(&self) -> bool {
        self.0 == StatusCode::OK
    }

    fn body(&self) -> &[u8] {
        &self.1
    }
}

// == Served ==
/// Outcome of one pass through the cache.
#[derive(Debug, PartialEq)]
pub enum Served<T> {
    /// Decoded stored body; the handler was not called
    Hit(Vec<u8>),
    /// The handler ran after a lookup miss
    Miss(T),
    /// The handler ran without touching the store
    Bypass(T),
}

impl<T> Served<T> {
    pub fn cache_status(&self) -> &'static str {
        match self {
            Served::Hit(_) => "HIT",
            Served::Miss(_) => "MISS",
            Served::Bypass(_) => "BYPASS",
        }
    }
}

// == Response Cache ==
/// Cache-aside component shared by every cached route.
#[derive(Clone)]
pub struct ResponseCache {
    manager: Arc<ConnectionManager>,
    compression_threshold: usize,
    ttl: u64,
    max_body_bytes: usize,
    content_type: HeaderValue,
}

impl ResponseCache {
    /// Builds a cache; `default_ttl` is clamped to `1..=MAX_TTL_SECONDS`.
    pub fn new(
        manager: Arc<ConnectionManager>,
        compression_threshold: usize,
        default_ttl: u64,
    ) -> Self {
        Self {
            manager,
            compression_threshold,
            ttl: clamp_ttl(default_ttl),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            content_type: HeaderValue::from_static("application/json"),
        }
    }

    pub fn from_config(manager: Arc<ConnectionManager>, config: &Config) -> Self {
        Self::new(manager, config.compression_threshold, config.default_ttl)
            .with_max_body_bytes(config.max_body_bytes)
    }

    /// Copy of this cache storing entries for `ttl_seconds` instead of the default.
    pub fn with_ttl(&self, ttl_seconds: u64) -> Self {
        Self {
            ttl: clamp_ttl(ttl_seconds),
            ..self.clone()
        }
    }

    /// Copy of this cache passing bodies larger than `max_body_bytes` through uncached.
    pub fn with_max_body_bytes(&self, max_body_bytes: usize) -> Self {
        Self {
            max_body_bytes,
            ..self.clone()
        }
    }

    /// Copy of this cache labelling hits with `content_type`.
    pub fn with_content_type(&self, content_type: HeaderValue) -> Self {
        Self {
            content_type,
            ..self.clone()
        }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    // == Serve ==
    /// Runs the cache-aside protocol for `key` around `handler`.
    pub async fn serve<T, F, Fut>(&self, key: &CacheKey, handler: F) -> Served<T>
    where
        T: HandlerOutput,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let stats = self.manager.stats();

        if !self.manager.is_connected() {
            stats.record_bypass();
            return Served::Bypass(handler().await);
        }

        if let Some(stored) = self.manager.get(key.as_str()).await {
            match codec::decode(&stored) {
                Ok(body) => {
                    debug!("Cache hit for {}", key);
                    stats.record_hit();
                    return Served::Hit(body);
                }
                Err(err) => {
                    warn!("Discarding corrupt cache entry {}: {}", key, err);
                    stats.record_corrupt();
                }
            }
        }

        debug!("Cache miss for {}", key);
        stats.record_miss();
        let output = handler().await;

        if output.is_success() {
            self.store(key, output.body()).await;
        }
        Served::Miss(output)
    }

    async fn store(&self, key: &CacheKey, body: &[u8]) {
        let encoded = match codec::encode(body, self.compression_threshold) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!("Failed to encode response for {}: {}", key, err);
                return;
            }
        };

        if !self.manager.set(key.as_str(), &encoded, self.ttl).await {
            debug!("Response for {} was not cached", key);
        }
    }

    fn hit_response(&self, body: Vec<u8>) -> Response {
        let mut response = (StatusCode::OK, body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, self.content_type.clone());
        response
    }
}

fn clamp_ttl(ttl_seconds: u64) -> u64 {
    let clamped = ttl_seconds.clamp(1, MAX_TTL_SECONDS);
    if clamped != ttl_seconds {
        warn!("Cache TTL {}s out of range, using {}s", ttl_seconds, clamped);
    }
    clamped
}

// == Buffered Response ==
/// An axum response prepared for caching.
pub enum BufferedResponse {
    /// Body collected into memory
    Buffered { parts: Parts, body: Bytes },
    /// Body of unknown or oversized length, forwarded untouched and never cached
    Streamed(Response),
}

impl BufferedResponse {
    /// Collects the body of `response` when it is known to fit in `limit` bytes.
    ///
    /// A body that fails mid-stream is reported as a 500 so it is never cached.
    pub async fn collect(response: Response, limit: usize) -> Self {
        let fits = response
            .body()
            .size_hint()
            .upper()
            .is_some_and(|len| len <= limit as u64);
        if !fits {
            debug!("Response body exceeds {} bytes or is unbounded, not caching", limit);
            return Self::Streamed(response);
        }

        let (mut parts, body) = response.into_parts();
        let body = match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("Failed to read handler response body: {}", err);
                parts.status = StatusCode::INTERNAL_SERVER_ERROR;
                parts.headers.remove(header::CONTENT_LENGTH);
                Bytes::new()
            }
        };
        Self::Buffered { parts, body }
    }
}

impl HandlerOutput for BufferedResponse {
    fn is_success(&self) -> bool {
        match self {
            Self::Buffered { parts, .. } => parts.status == StatusCode::OK,
            Self::Streamed(_) => false,
        }
    }

    fn body(&self) -> &[u8] {
        match self {
            Self::Buffered { body, .. } => body,
            Self::Streamed(_) => &[],
        }
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Buffered { parts, body } => Response::from_parts(parts, Body::from(body)),
            Self::Streamed(response) => response,
        }
    }
}

// == Request Key ==
/// Derives the key for a request URI from its path and query parameters.
pub fn request_key(uri: &Uri) -> CacheKey {
    let params = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(params)) => params,
        Err(_) => uri
            .query()
            .map(|raw| vec![(String::new(), raw.to_string())])
            .unwrap_or_default(),
    };
    codec::derive_key(uri.path(), params)
}

// == Axum Middleware ==
/// axum middleware caching `GET` responses of the wrapped route.
pub async fn cache_response(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    // Nested routers strip their prefix from `uri()`
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| request.uri().clone());
    let key = request_key(&uri);

    let limit = cache.max_body_bytes;
    let served = cache
        .serve(&key, || async move {
            BufferedResponse::collect(next.run(request).await, limit).await
        })
        .await;

    let status = HeaderValue::from_static(served.cache_status());
    let mut response = match served {
        Served::Hit(body) => cache.hit_response(body),
        Served::Miss(output) | Served::Bypass(output) => output.into_response(),
    };
    response.headers_mut().insert(X_CACHE.clone(), status);
    response
}
