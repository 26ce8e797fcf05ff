//! In-memory registry of per-shopper sessions.
//!
//! Each browser session maps to one [`ShopperSession`] behind an async mutex,
//! so concurrent requests from the same shopper apply their cart mutations one
//! at a time. Entries idle for longer than the session cookie lifetime are
//! evicted.

use std::sync::Arc;
use std::time::Duration;

use atelier_core::ShopperSession;
use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Idle lifetime of a shopper entry; matches the session cookie expiry.
const SHOPPER_IDLE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Upper bound on concurrently tracked shoppers.
const MAX_SHOPPERS: u64 = 100_000;

/// A shared handle to one shopper's session.
pub type SharedShopper = Arc<Mutex<ShopperSession>>;

/// Registry of shopper sessions keyed by shopper id.
#[derive(Clone)]
pub struct ShopperRegistry {
    sessions: Cache<Uuid, SharedShopper>,
}

impl Default for ShopperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShopperRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_idle(SHOPPER_IDLE)
    }

    /// A registry whose entries expire after `idle` without access.
    #[must_use]
    pub fn with_idle(idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SHOPPERS)
            .time_to_idle(idle)
            .build();
        Self { sessions }
    }

    /// The session for `id`, starting an anonymous one on first sight.
    pub async fn get_or_create(&self, id: Uuid) -> SharedShopper {
        self.sessions
            .get_with(id, async { Arc::new(Mutex::new(ShopperSession::new())) })
            .await
    }

    /// The session for `id`, if one exists.
    pub async fn get(&self, id: Uuid) -> Option<SharedShopper> {
        self.sessions.get(&id).await
    }

    /// Ids of every tracked shopper.
    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<Uuid> {
        self.sessions.iter().map(|(id, _)| *id).collect()
    }

    /// Drop a shopper's session entirely.
    pub async fn forget(&self, id: Uuid) {
        self.sessions.invalidate(&id).await;
    }
}
