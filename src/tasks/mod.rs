//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired entries from the in-memory store
//! - Reconnect: Health-checks the cache store while it is marked disconnected

mod cleanup;
mod reconnect;

pub use cleanup::spawn_cleanup_task;
pub use reconnect::spawn_reconnect_task;
