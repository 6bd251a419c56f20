//! Connection Manager Module
//!
//! Owns the connection state for the external cache store and exposes a
//! fail-safe get/set surface: store errors are logged, flip the state to
//! `Disconnected`, and come back to callers as a miss or `false`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, KeyValueStore, RedisStore};
use crate::config::{is_valid_ttl, Config};
use crate::error::{StoreError, StoreResult};

// == Connection State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

// == Retry Policy ==
/// Startup connection attempts with capped exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total connection attempts; zero skips connecting entirely
    pub max_retries: u32,
    /// Unit multiplied by `2^attempt`
    pub base_delay: Duration,
    /// Ceiling for a single wait
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Wait after failed attempt `attempt` (1-based): `base * 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

// == Connection Manager ==
pub struct ConnectionManager {
    /// None when no store could be configured at all
    store: Option<Arc<dyn KeyValueStore>>,
    connected: AtomicBool,
    operation_timeout: Duration,
    stats: CacheStats,
}

impl ConnectionManager {
    // == Constructor ==
    /// Creates a manager in the `Disconnected` state without touching the store.
    pub fn new(store: Arc<dyn KeyValueStore>, operation_timeout: Duration) -> Self {
        Self {
            store: Some(store),
            connected: AtomicBool::new(false),
            operation_timeout,
            stats: CacheStats::new(),
        }
    }

    /// A manager with no store; permanently `Disconnected`.
    pub fn detached() -> Self {
        Self {
            store: None,
            connected: AtomicBool::new(false),
            operation_timeout: Duration::ZERO,
            stats: CacheStats::new(),
        }
    }

    // == Initialize ==
    /// Connects to `store`, retrying per `policy`.
    ///
    /// Never fails: when every attempt fails the returned manager is
    /// `Disconnected` and callers run in pass-through mode.
    pub async fn initialize(
        store: Arc<dyn KeyValueStore>,
        policy: &RetryPolicy,
        operation_timeout: Duration,
    ) -> Self {
        let manager = Self::new(store, operation_timeout);

        for attempt in 1..=policy.max_retries {
            match manager.ping().await {
                Ok(()) => {
                    manager.connected.store(true, Ordering::SeqCst);
                    info!("Cache store connection established");
                    return manager;
                }
                Err(err) => {
                    warn!(
                        "Cache store connection failed (attempt {}/{}): {}",
                        attempt, policy.max_retries, err
                    );
                    if attempt < policy.max_retries {
                        let delay = policy.backoff(attempt);
                        info!("Retrying cache store connection in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        error!(
            "Failed to connect to cache store after {} attempts, caching disabled",
            policy.max_retries
        );
        manager
    }

    /// Opens the Redis store named by `config` and initializes against it.
    pub async fn connect_redis(config: &Config) -> Self {
        let url = config.redis_url();
        let store = match RedisStore::open(&url, config.connect_timeout()) {
            Ok(store) => store,
            Err(err) => {
                error!("Invalid cache store address {}: {}", url, err);
                return Self::detached();
            }
        };

        info!("Connecting to cache store at {}", url);
        let policy = RetryPolicy::with_max_retries(config.max_retries);
        Self::initialize(Arc::new(store), &policy, config.operation_timeout()).await
    }

    // == State ==
    pub fn state(&self) -> ConnectionState {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    // == Reconnect ==
    /// Single health check; moves to `Connected` on success.
    pub async fn reconnect(&self) -> bool {
        match self.ping().await {
            Ok(()) => {
                if !self.connected.swap(true, Ordering::SeqCst) {
                    info!("Cache store connection restored");
                }
                true
            }
            Err(err) => {
                debug!("Cache store still unreachable: {}", err);
                false
            }
        }
    }

    // == Get ==
    /// Reads `key`; `None` on miss, while disconnected, or on any store error.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let store = self.live_store()?;
        match self.bounded(store.get(key)).await {
            Ok(value) => value,
            Err(err) => {
                self.mark_disconnected("GET", &err);
                None
            }
        }
    }

    // == Set ==
    /// Writes `key` with a TTL; `false` while disconnected or on any store error.
    ///
    /// A TTL the store would reject is refused up front and leaves the
    /// connection state alone.
    pub async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> bool {
        let Some(store) = self.live_store() else {
            return false;
        };
        if !is_valid_ttl(ttl_seconds) {
            warn!("Refusing to cache {} with invalid TTL {}s", key, ttl_seconds);
            self.stats.record_store_failure();
            return false;
        }
        match self.bounded(store.set_ex(key, value, ttl_seconds)).await {
            Ok(()) => {
                self.stats.record_store();
                true
            }
            Err(err) => {
                self.mark_disconnected("SETEX", &err);
                false
            }
        }
    }

    fn live_store(&self) -> Option<&Arc<dyn KeyValueStore>> {
        if self.is_connected() {
            self.store.as_ref()
        } else {
            None
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let store = self.store.as_ref().ok_or(StoreError::Unavailable)?;
        self.bounded(store.ping()).await
    }

    async fn bounded<T>(&self, operation: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tokio::time::timeout(self.operation_timeout, operation)
            .await
            .unwrap_or_else(|_| Err(StoreError::Timeout(self.operation_timeout.as_millis() as u64)))
    }

    fn mark_disconnected(&self, operation: &str, err: &StoreError) {
        self.stats.record_store_failure();
        if self.connected.swap(false, Ordering::SeqCst) {
            error!("Cache {} failed, marking store disconnected: {}", operation, err);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use async_trait::async_trait;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    async fn connected(store: Arc<MemoryStore>) -> ConnectionManager {
        ConnectionManager::initialize(store, &fast_policy(1), TIMEOUT).await
    }

    /// Store whose operations never finish in time.
    struct StalledStore;

    #[async_trait]
    impl KeyValueStore for StalledStore {
        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }

        async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn set_ex(&self, _key: &str, _value: &[u8], _ttl: u64) -> StoreResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(4), Duration::from_secs(10));
        assert_eq!(policy.backoff(40), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_initialize_connects() {
        let store = Arc::new(MemoryStore::new());
        let manager = connected(store.clone()).await;

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(store.operation_count(), 1);
    }

    #[tokio::test]
    async fn test_initialize_exhausts_retries_without_failing() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);

        let manager = ConnectionManager::initialize(store.clone(), &fast_policy(3), TIMEOUT).await;

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(store.operation_count(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_never_pings() {
        let store = Arc::new(MemoryStore::new());
        let manager = ConnectionManager::initialize(store.clone(), &fast_policy(0), TIMEOUT).await;

        assert!(!manager.is_connected());
        assert_eq!(store.operation_count(), 0);
    }

    #[tokio::test]
    async fn test_get_and_set_when_connected() {
        let store = Arc::new(MemoryStore::new());
        let manager = connected(store).await;

        assert!(manager.set("k", b"v", 60).await);
        assert_eq!(manager.get("k").await.unwrap(), b"v");
        assert_eq!(manager.get("missing").await, None);
        assert_eq!(manager.stats().snapshot().stores, 1);
    }

    #[tokio::test]
    async fn test_disconnected_makes_no_store_calls() {
        let store = Arc::new(MemoryStore::new());
        let manager = ConnectionManager::new(store.clone(), TIMEOUT);

        assert_eq!(manager.get("k").await, None);
        assert!(!manager.set("k", b"v", 60).await);
        assert_eq!(store.operation_count(), 0);
    }

    #[tokio::test]
    async fn test_store_error_marks_disconnected() {
        let store = Arc::new(MemoryStore::new());
        let manager = connected(store.clone()).await;

        store.set_available(false);
        assert_eq!(manager.get("k").await, None);
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        // Subsequent calls short-circuit without reaching the store.
        let calls = store.operation_count();
        assert!(!manager.set("k", b"v", 60).await);
        assert_eq!(store.operation_count(), calls);
        assert_eq!(manager.stats().snapshot().store_failures, 1);
    }

    #[tokio::test]
    async fn test_set_failure_returns_false() {
        let store = Arc::new(MemoryStore::new());
        let manager = connected(store.clone()).await;

        store.set_available(false);
        assert!(!manager.set("k", b"v", 60).await);
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_invalid_ttl_is_refused_without_disconnecting() {
        let store = Arc::new(MemoryStore::new());
        let manager = connected(store.clone()).await;
        let calls = store.operation_count();

        assert!(!manager.set("k", b"v", 0).await);
        assert!(!manager.set("k", b"v", u64::MAX).await);

        assert!(manager.is_connected());
        assert_eq!(store.operation_count(), calls);
        assert_eq!(manager.stats().snapshot().store_failures, 2);
        assert!(manager.set("k", b"v", 60).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_backoff_waits_between_attempts() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);

        let started = tokio::time::Instant::now();
        let manager =
            ConnectionManager::initialize(store.clone(), &RetryPolicy::default(), TIMEOUT).await;
        let waited = started.elapsed();

        assert!(!manager.is_connected());
        assert_eq!(store.operation_count(), 3);
        // 2s after the first attempt, 4s after the second, none after the last
        assert!(waited >= Duration::from_secs(6), "waited {:?}", waited);
        assert!(waited < Duration::from_secs(7), "waited {:?}", waited);
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let manager = ConnectionManager::initialize(
            Arc::new(StalledStore),
            &fast_policy(1),
            Duration::from_millis(50),
        )
        .await;
        assert!(manager.is_connected());

        let started = std::time::Instant::now();
        assert_eq!(manager.get("k").await, None);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_reconnect_restores_connection() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let manager = ConnectionManager::initialize(store.clone(), &fast_policy(1), TIMEOUT).await;
        assert!(!manager.is_connected());

        assert!(!manager.reconnect().await);

        store.set_available(true);
        assert!(manager.reconnect().await);
        assert!(manager.set("k", b"v", 60).await);
    }

    #[tokio::test]
    async fn test_detached_manager() {
        let manager = ConnectionManager::detached();
        assert!(!manager.reconnect().await);
        assert_eq!(manager.get("k").await, None);
    }

    #[tokio::test]
    async fn test_connect_redis_unreachable_degrades() {
        let config = Config {
            redis_host: "127.0.0.1".to_string(),
            redis_port: 1,
            max_retries: 1,
            connect_timeout_ms: 200,
            ..Config::default()
        };
        let manager = ConnectionManager::connect_redis(&config).await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}
