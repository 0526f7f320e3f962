//! Test support: an in-memory [`RouteStore`] with failure injection.

use crate::store::{RouteStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// [`RouteStore`] backed by a plain map. `fail_next()` makes the next
/// operation return [`StoreError::Unavailable`], for exercising
/// persistence-failure paths.
#[derive(Default)]
pub struct InMemoryRouteStore {
    entries: Mutex<HashMap<String, String>>,
    fail_next: AtomicBool,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(entries: HashMap<String, String>) -> Self {
        InMemoryRouteStore {
            entries: Mutex::new(entries),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn entries(&self) -> HashMap<String, String> {
        self.entries.lock().clone()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn set_route(&self, domain: &str, port: &str) -> Result<(), StoreError> {
        self.check_failure()?;
        self.entries
            .lock()
            .insert(domain.to_owned(), port.to_owned());
        Ok(())
    }

    async fn delete_route(&self, domain: &str) -> Result<(), StoreError> {
        self.check_failure()?;
        self.entries.lock().remove(domain);
        Ok(())
    }

    async fn fetch_all(&self) -> Result<HashMap<String, String>, StoreError> {
        self.check_failure()?;
        Ok(self.entries.lock().clone())
    }
}
