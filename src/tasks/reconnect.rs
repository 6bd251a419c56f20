//! Reconnect Task
//!
//! Periodically health-checks the cache store while the connection manager
//! is disconnected, so caching resumes once the store is back.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ConnectionManager;

/// Spawns the reconnect loop, or returns `None` when `interval_secs` is zero.
///
/// While connected the task only sleeps; request handling never waits on it.
pub fn spawn_reconnect_task(
    manager: Arc<ConnectionManager>,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Cache reconnect task disabled");
        return None;
    }
    Some(spawn_with_interval(manager, Duration::from_secs(interval_secs)))
}

fn spawn_with_interval(manager: Arc<ConnectionManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting cache reconnect task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            if manager.is_connected() {
                continue;
            }
            if !manager.reconnect().await {
                debug!("Cache store still down, next check in {:?}", interval);
            }
        }
    })
}
