//! Secure storage stub for platforms without native support

use crate::error::{StoreError, StoreResult};

use super::backend::SecureStore;

/// A secure store whose every operation fails with `Unavailable`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl SecureStore for UnavailableStore {
    fn store(&self, _service: &str, _account: &str, _secret: &[u8]) -> StoreResult<()> {
        Err(StoreError::Unavailable("store".to_string()))
    }

    fn retrieve(&self, _service: &str, _account: &str) -> StoreResult<Vec<u8>> {
        Err(StoreError::Unavailable("retrieve".to_string()))
    }

    fn delete(&self, _service: &str, _account: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("delete".to_string()))
    }

    fn backend_id(&self) -> &'static str {
        "unavailable"
    }

    fn display_name(&self) -> &'static str {
        "No secure storage"
    }
}
