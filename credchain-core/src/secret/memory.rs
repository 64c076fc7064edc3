//! In-process secure storage
//!
//! Keeps items in a `HashMap` for the lifetime of the value. Used in tests
//! and by embedders that want an isolated store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};

use super::backend::SecureStore;

type Items = HashMap<(String, String), Vec<u8>>;

/// In-memory secure store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Items>,
}

impl MemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().map_or(0, |items| items.len())
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Items>> {
        self.items
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

fn not_found(service: &str, account: &str) -> StoreError {
    StoreError::NotFound {
        service: service.to_string(),
        account: account.to_string(),
    }
}

impl SecureStore for MemoryStore {
    fn store(&self, service: &str, account: &str, secret: &[u8]) -> StoreResult<()> {
        self.lock()?
            .insert((service.to_string(), account.to_string()), secret.to_vec());
        Ok(())
    }

    fn retrieve(&self, service: &str, account: &str) -> StoreResult<Vec<u8>> {
        self.lock()?
            .get(&(service.to_string(), account.to_string()))
            .cloned()
            .ok_or_else(|| not_found(service, account))
    }

    fn delete(&self, service: &str, account: &str) -> StoreResult<()> {
        self.lock()?
            .remove(&(service.to_string(), account.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(service, account))
    }

    fn backend_id(&self) -> &'static str {
        "memory"
    }

    fn display_name(&self) -> &'static str {
        "In-memory store"
    }
}
