use crate::errors::RoutesError;
use crate::metrics_defs;
use crate::store::RouteStore;
use crate::table::RoutingTable;
use shared::counter;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owns the routing table and its durable store, and keeps the two
/// consistent: every mutation is persisted before the in-memory table
/// changes, so the table never exposes a mapping the store has not
/// committed.
#[derive(Clone)]
pub struct RouteManager {
    store: Arc<dyn RouteStore>,
    table: Arc<RoutingTable>,
    // Flips once the first reload has succeeded; read by the
    // readiness endpoint.
    ready: Arc<AtomicBool>,
}

impl RouteManager {
    pub fn new(store: Arc<dyn RouteStore>) -> Self {
        RouteManager {
            store,
            table: Arc::new(RoutingTable::new()),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle to the live routing table for the dispatch path.
    pub fn table(&self) -> Arc<RoutingTable> {
        Arc::clone(&self.table)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Persist `domain -> port`, then expose it to dispatch. On a store
    /// failure the table is left unchanged and the error is returned.
    pub async fn add_route(&self, domain: &str, port: &str) -> Result<(), RoutesError> {
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            return Err(RoutesError::EmptyDomain);
        }
        match port.parse::<u16>() {
            Ok(p) if p != 0 => {}
            _ => return Err(RoutesError::InvalidPort(port.to_string())),
        }

        self.store.set_route(&domain, port).await?;
        self.table.insert(&domain, port);

        counter!(metrics_defs::ROUTES_ADDED).increment(1);
        tracing::info!(%domain, port, "route added");
        Ok(())
    }

    /// Delete `domain` from the store, then evict it from the table.
    /// Removing an unmapped domain succeeds as a no-op.
    pub async fn remove_route(&self, domain: &str) -> Result<(), RoutesError> {
        let domain = domain.trim().to_ascii_lowercase();
        if domain.is_empty() {
            return Err(RoutesError::EmptyDomain);
        }

        self.store.delete_route(&domain).await?;
        self.table.remove(&domain);

        counter!(metrics_defs::ROUTES_REMOVED).increment(1);
        tracing::info!(%domain, "route removed");
        Ok(())
    }

    /// Current table snapshot.
    pub fn list_routes(&self) -> HashMap<String, String> {
        self.table.snapshot()
    }

    /// Rebuild the table wholesale from the store and return the new
    /// snapshot. On a store failure the existing (stale-but-valid)
    /// table is left untouched.
    ///
    /// A mutation landing between the store read and the table swap can
    /// be dropped from the cache until the next reload; mutations are
    /// operator-driven and rare, so this eventual-consistency window is
    /// accepted rather than closed with versioning.
    pub async fn reload(&self) -> Result<HashMap<String, String>, RoutesError> {
        let entries = self.store.fetch_all().await?;
        self.table.replace_all(entries.clone());
        self.ready.store(true, Ordering::Relaxed);

        counter!(metrics_defs::RELOADS).increment(1);
        tracing::info!(count = entries.len(), "routing table reloaded");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::InMemoryRouteStore;

    fn test_manager(store: InMemoryRouteStore) -> RouteManager {
        RouteManager::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_add_route_round_trip() {
        let manager = test_manager(InMemoryRouteStore::new());

        manager.add_route("svc.test", "9000").await.unwrap();

        assert_eq!(manager.table().get("svc.test").as_deref(), Some("9000"));
        assert_eq!(
            manager.list_routes(),
            HashMap::from([("svc.test".to_string(), "9000".to_string())])
        );
    }

    #[tokio::test]
    async fn test_add_route_normalizes_domain() {
        let manager = test_manager(InMemoryRouteStore::new());

        manager.add_route(" Svc.Test ", "9000").await.unwrap();
        assert_eq!(manager.table().get("svc.test").as_deref(), Some("9000"));
    }

    #[tokio::test]
    async fn test_add_route_rejects_bad_input() {
        let manager = test_manager(InMemoryRouteStore::new());

        assert!(matches!(
            manager.add_route("", "9000").await,
            Err(RoutesError::EmptyDomain)
        ));
        assert!(matches!(
            manager.add_route("svc.test", "http").await,
            Err(RoutesError::InvalidPort(_))
        ));
        assert!(matches!(
            manager.add_route("svc.test", "0").await,
            Err(RoutesError::InvalidPort(_))
        ));
        assert!(manager.list_routes().is_empty());
    }

    #[tokio::test]
    async fn test_remove_route_and_repeat_is_noop() {
        let manager = test_manager(InMemoryRouteStore::new());

        manager.add_route("svc.test", "9000").await.unwrap();
        manager.remove_route("svc.test").await.unwrap();
        assert_eq!(manager.table().get("svc.test"), None);

        // no error on repeated removal
        manager.remove_route("svc.test").await.unwrap();
    }

    #[tokio::test]
    async fn test_persistence_failure_leaves_table_unchanged() {
        let store = Arc::new(InMemoryRouteStore::new());
        let manager = RouteManager::new(store.clone() as Arc<dyn RouteStore>);

        manager.add_route("a.test", "1").await.unwrap();
        let before = manager.list_routes();

        store.fail_next();
        assert!(manager.add_route("b.test", "2").await.is_err());
        assert_eq!(manager.list_routes(), before);
    }

    #[tokio::test]
    async fn test_remove_failure_keeps_entry() {
        let store = Arc::new(InMemoryRouteStore::new());
        let manager = RouteManager::new(store.clone() as Arc<dyn RouteStore>);

        manager.add_route("svc.test", "9000").await.unwrap();
        store.fail_next();

        assert!(manager.remove_route("svc.test").await.is_err());
        assert_eq!(manager.table().get("svc.test").as_deref(), Some("9000"));
    }

    #[tokio::test]
    async fn test_reload_replaces_table() {
        let store = Arc::new(InMemoryRouteStore::seeded(HashMap::from([
            ("a.test".to_string(), "1".to_string()),
            ("b.test".to_string(), "2".to_string()),
        ])));
        let manager = RouteManager::new(store as Arc<dyn RouteStore>);

        // stale entry that the store does not hold
        manager.table().insert("stale.test", "9");

        let snapshot = manager.reload().await.unwrap();
        assert_eq!(
            snapshot,
            HashMap::from([
                ("a.test".to_string(), "1".to_string()),
                ("b.test".to_string(), "2".to_string()),
            ])
        );
        assert_eq!(manager.list_routes(), snapshot);
        assert!(manager.is_ready());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_table() {
        let store = Arc::new(InMemoryRouteStore::new());
        let manager = RouteManager::new(store.clone() as Arc<dyn RouteStore>);

        manager.add_route("svc.test", "9000").await.unwrap();
        store.fail_next();

        assert!(manager.reload().await.is_err());
        assert_eq!(manager.table().get("svc.test").as_deref(), Some("9000"));
        assert!(!manager.is_ready());
    }
}
