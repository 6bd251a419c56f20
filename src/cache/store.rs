//! Key-Value Store Module
//!
//! The narrow protocol the connection manager needs from a cache store
//! (`PING`, `GET`, `SETEX`) and its Redis implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager as RedisConnection;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

// == Store Trait ==
/// A networked key-value store offering at least ping/get/set-with-expiry.
///
/// Implementations report failures as [`StoreError`]; deciding what a failure
/// means for the cache is left to the connection manager.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Verifies liveness, establishing the underlying connection if needed.
    async fn ping(&self) -> StoreResult<()>;

    /// Reads the raw bytes stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, expiring after `ttl_seconds`.
    async fn set_ex(&self, key: &str, value: &[u8], ttl_seconds: u64) -> StoreResult<()>;
}

// == Redis Store ==
/// Redis-backed store using a shared multiplexed connection.
///
/// The handle is created lazily by [`KeyValueStore::ping`], so a store built
/// while Redis is down becomes usable as soon as a later ping succeeds.
pub struct RedisStore {
    client: redis::Client,
    connection: RwLock<Option<RedisConnection>>,
    connect_timeout: Duration,
}

impl RedisStore {
    /// Creates a store for `url` (`redis://host:port/db`) without connecting.
    pub fn open(url: &str, connect_timeout: Duration) -> StoreResult<Self> {
        let client = redis::Client::open(url).map_err(StoreError::from)?;
        Ok(Self {
            client,
            connection: RwLock::new(None),
            connect_timeout,
        })
    }

    async fn connect(&self) -> StoreResult<RedisConnection> {
        let pending = self.client.get_connection_manager();
        match tokio::time::timeout(self.connect_timeout, pending).await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(err)) => Err(StoreError::from(err)),
            Err(_) => Err(StoreError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }

    /// Returns a clone of the live handle; clones share the same multiplexed connection.
    async fn handle(&self) -> StoreResult<RedisConnection> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or(StoreError::Unavailable)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut connection = match self.handle().await {
            Ok(connection) => connection,
            Err(_) => {
                let connection = self.connect().await?;
                *self.connection.write().await = Some(connection.clone());
                debug!("Redis connection handle created");
                connection
            }
        };

        let reply: String = redis::cmd("PING").query_async(&mut connection).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Protocol(format!("unexpected PING reply: {}", reply)))
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut connection = self.handle().await?;
        let value: Option<Vec<u8>> = connection.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl_seconds: u64) -> StoreResult<()> {
        let mut connection = self.handle().await?;
        let _: () = connection.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }
}
