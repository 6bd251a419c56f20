//! Configuration Module
//!
//! Handles loading the cache and server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Longest TTL the cache will request from a store, in seconds (ten years).
pub const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// A TTL the store can honour: at least one second, at most [`MAX_TTL_SECONDS`].
pub fn is_valid_ttl(ttl_seconds: u64) -> bool {
    (1..=MAX_TTL_SECONDS).contains(&ttl_seconds)
}

/// Which key-value store backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Redis,
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!("Unknown cache backend: {}", other)),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache store host
    pub redis_host: String,
    /// Cache store port
    pub redis_port: u16,
    /// Logical database index on the cache store
    pub redis_db: i64,
    /// Connection attempts made at startup
    pub max_retries: u32,
    /// Payloads larger than this many bytes are compressed
    pub compression_threshold: usize,
    /// TTL in seconds for entries without a route-specific TTL
    pub default_ttl: u64,
    /// Largest response body, in bytes, the middleware buffers for caching
    pub max_body_bytes: usize,
    /// Timeout for establishing a store connection, in milliseconds
    pub connect_timeout_ms: u64,
    /// Timeout for a single get/set/ping, in milliseconds
    pub operation_timeout_ms: u64,
    /// Seconds between health checks while disconnected (0 disables)
    pub reconnect_interval: u64,
    /// Store backend selection
    pub backend: Backend,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_HOST` - Cache store host (default: localhost)
    /// - `REDIS_PORT` - Cache store port (default: 6379)
    /// - `REDIS_DB` - Database index (default: 0)
    /// - `CACHE_MAX_RETRIES` - Startup connection attempts (default: 3)
    /// - `CACHE_COMPRESSION_THRESHOLD` - Compression threshold in bytes (default: 10240)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds, 1 to ten years (default: 600)
    /// - `CACHE_MAX_BODY_BYTES` - Largest cacheable response body (default: 1048576)
    /// - `CACHE_CONNECT_TIMEOUT_MS` - Connect timeout (default: 2000)
    /// - `CACHE_OPERATION_TIMEOUT_MS` - Per-operation timeout (default: 5000)
    /// - `CACHE_RECONNECT_INTERVAL` - Reconnect check interval in seconds (default: 30)
    /// - `CACHE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `SERVER_PORT` - HTTP server port (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_host: env::var("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_var("REDIS_PORT").unwrap_or(defaults.redis_port),
            redis_db: parse_var("REDIS_DB").unwrap_or(defaults.redis_db),
            max_retries: parse_var("CACHE_MAX_RETRIES").unwrap_or(defaults.max_retries),
            compression_threshold: parse_var("CACHE_COMPRESSION_THRESHOLD")
                .unwrap_or(defaults.compression_threshold),
            default_ttl: ttl_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            max_body_bytes: parse_var("CACHE_MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            connect_timeout_ms: parse_var("CACHE_CONNECT_TIMEOUT_MS")
                .unwrap_or(defaults.connect_timeout_ms),
            operation_timeout_ms: parse_var("CACHE_OPERATION_TIMEOUT_MS")
                .unwrap_or(defaults.operation_timeout_ms),
            reconnect_interval: parse_var("CACHE_RECONNECT_INTERVAL")
                .unwrap_or(defaults.reconnect_interval),
            backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.backend),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }

    /// Connection URL for the Redis backend.
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Reads `name` from the environment; unset or unparsable values yield `None`.
fn parse_var<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = env::var(name).ok()?;
    parse_value(name, &raw)
}

fn parse_value<T>(name: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring invalid {}={:?}, using default: {}", name, raw, err);
            None
        }
    }
}

fn ttl_var(name: &str) -> Option<u64> {
    parse_var(name).and_then(|ttl| checked_ttl(name, ttl))
}

fn checked_ttl(name: &str, ttl: u64) -> Option<u64> {
    if is_valid_ttl(ttl) {
        Some(ttl)
    } else {
        warn!(
            "Ignoring {}={}, TTL must be between 1 and {} seconds",
            name, ttl, MAX_TTL_SECONDS
        );
        None
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
            max_retries: 3,
            compression_threshold: 10 * 1024,
            default_ttl: 600,
            max_body_bytes: 1024 * 1024,
            connect_timeout_ms: 2000,
            operation_timeout_ms: 5000,
            reconnect_interval: 30,
            backend: Backend::Redis,
            server_port: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.redis_host, "localhost");
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.compression_threshold, 10240);
        assert_eq!(config.default_ttl, 600);
        assert_eq!(config.backend, Backend::Redis);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("REDIS_HOST");
        env::remove_var("REDIS_PORT");
        env::remove_var("CACHE_DEFAULT_TTL");
        env::remove_var("CACHE_BACKEND");

        let config = Config::from_env();
        assert_eq!(config.redis_host, "localhost");
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.default_ttl, 600);
        assert_eq!(config.backend, Backend::Redis);
    }

    #[test]
    fn test_redis_url_includes_database() {
        let config = Config {
            redis_host: "cache.internal".to_string(),
            redis_port: 6380,
            redis_db: 2,
            ..Config::default()
        };
        assert_eq!(config.redis_url(), "redis://cache.internal:6380/2");
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("memory".parse::<Backend>(), Ok(Backend::Memory));
        assert_eq!("REDIS".parse::<Backend>(), Ok(Backend::Redis));
        assert!("memcached".parse::<Backend>().is_err());
    }

    #[test]
    fn test_unparsable_value_is_ignored() {
        assert_eq!(parse_value::<Backend>("CACHE_BACKEND", "memcache"), None);
        assert_eq!(parse_value::<Backend>("CACHE_BACKEND", " Memory "), Some(Backend::Memory));
        assert_eq!(parse_value::<u16>("SERVER_PORT", "eighty"), None);
    }

    #[test]
    fn test_ttl_bounds() {
        assert_eq!(checked_ttl("CACHE_DEFAULT_TTL", 0), None);
        assert_eq!(checked_ttl("CACHE_DEFAULT_TTL", 1), Some(1));
        assert_eq!(checked_ttl("CACHE_DEFAULT_TTL", MAX_TTL_SECONDS), Some(MAX_TTL_SECONDS));
        assert_eq!(checked_ttl("CACHE_DEFAULT_TTL", MAX_TTL_SECONDS + 1), None);
        assert_eq!(checked_ttl("CACHE_DEFAULT_TTL", u64::MAX), None);
    }
}
