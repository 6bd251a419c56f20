//! Cache Module
//!
//! Cache-aside response caching in front of HTTP handlers: key derivation and
//! payload envelopes ([`codec`]), a fail-safe connection to the key-value
//! store ([`ConnectionManager`]), and the per-request protocol
//! ([`ResponseCache`]).

pub mod codec;
mod connection;
mod entry;
mod memory;
mod middleware;
mod stats;
mod store;


// Re-export public types
pub use codec::{decode, derive_key, encode, CacheKey, COMPRESSED_MARKER};
pub use connection::{ConnectionManager, ConnectionState, RetryPolicy};
pub use entry::StoredEntry;
pub use memory::MemoryStore;
pub use middleware::{
    cache_response, request_key, BufferedResponse, HandlerOutput, ResponseCache, Served, X_CACHE,
};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{KeyValueStore, RedisStore};
