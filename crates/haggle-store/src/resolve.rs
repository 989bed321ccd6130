//! Backend selection with degraded-mode fallback.
//!
//! Resolution happens once at startup. A configured database that cannot be
//! reached is the one condition that marks the handle degraded; running
//! without any configured database is a deliberate volatile deployment.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::contract::NegotiationStore;
use crate::memory::MemoryStore;
use crate::postgres::PgStore;

/// Which backend a resolved handle ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Durable postgres store.
    Postgres,
    /// Volatile in-memory store.
    Memory,
}

impl StoreBackend {
    /// Returns the backend as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved store plus how resolution went.
#[derive(Clone)]
pub struct StoreHandle {
    /// The store all engine code runs against.
    pub store: Arc<dyn NegotiationStore>,
    /// Backend the handle landed on.
    pub backend: StoreBackend,
    /// True when a configured database could not be reached and the handle
    /// fell back to memory.
    pub degraded: bool,
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("backend", &self.backend)
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}

fn memory_handle(degraded: bool) -> StoreHandle {
    StoreHandle {
        store: Arc::new(MemoryStore::new()),
        backend: StoreBackend::Memory,
        degraded,
    }
}

/// Resolves the store to run against.
///
/// With a database url the durable backend is probed first; if the probe
/// fails the handle falls back to memory and reports itself degraded. With no
/// url the volatile backend is used directly.
pub async fn connect_store(database_url: Option<&str>) -> StoreHandle {
    match database_url {
        Some(url) => match PgStore::connect(url).await {
            Ok(store) => {
                debug!("negotiation store resolved to postgres");
                StoreHandle {
                    store: Arc::new(store),
                    backend: StoreBackend::Postgres,
                    degraded: false,
                }
            }
            Err(err) => {
                warn!(error = %err, "database unreachable, falling back to in-memory store");
                memory_handle(true)
            }
        },
        None => {
            debug!("no database configured, using in-memory store");
            memory_handle(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_resolves_to_memory_without_degradation() {
        let handle = connect_store(None).await;
        assert_eq!(handle.backend, StoreBackend::Memory);
        assert!(!handle.degraded);
    }

    #[tokio::test]
    async fn unreachable_database_degrades_to_memory() {
        // Port 9 (discard) refuses postgres connections immediately.
        let handle = connect_store(Some("postgres://127.0.0.1:9/haggle")).await;
        assert_eq!(handle.backend, StoreBackend::Memory);
        assert!(handle.degraded);
    }

    #[tokio::test]
    async fn resolved_memory_store_works() {
        let handle = connect_store(None).await;
        let negotiation = handle
            .store
            .create_negotiation("buyer-1", "provider-1", None)
            .await
            .unwrap();
        let fetched = handle.store.get_negotiation(&negotiation.id).await.unwrap();
        assert!(fetched.is_some());
    }

    #[test]
    fn handle_debug_does_not_expose_store() {
        let handle = memory_handle(false);
        let rendered = format!("{handle:?}");
        assert!(rendered.contains("backend"));
        assert!(rendered.contains(".."));
    }
}
