//! Native OS secure storage backend
//!
//! Uses the `keyring` crate: Keychain on macOS, Credential Manager on
//! Windows, the kernel keyring on Linux. Built without the `native-store`
//! feature, every operation fails with `StoreError::Unavailable`.

use crate::error::{StoreError, StoreResult};

use super::backend::SecureStore;

/// Native secure storage backend
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeStore;

impl NativeStore {
    /// Creates a new native backend handle
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether this build includes native storage support
    #[must_use]
    pub const fn compiled_in() -> bool {
        cfg!(feature = "native-store")
    }
}

#[cfg(feature = "native-store")]
mod imp {
    use tracing::debug;

    use super::{NativeStore, SecureStore, StoreError, StoreResult};

    fn entry(op: &str, service: &str, account: &str) -> StoreResult<keyring::Entry> {
        keyring::Entry::new(service, account).map_err(|e| map_error(op, service, account, e))
    }

    fn map_error(op: &str, service: &str, account: &str, error: keyring::Error) -> StoreError {
        match error {
            keyring::Error::NoEntry => StoreError::NotFound {
                service: service.to_string(),
                account: account.to_string(),
            },
            keyring::Error::NoStorageAccess(e) | keyring::Error::PlatformFailure(e) => {
                StoreError::Unavailable(format!("{op} ({e})"))
            }
            other => StoreError::Backend(format!("{op} failed: {other}")),
        }
    }

    impl SecureStore for NativeStore {
        fn store(&self, service: &str, account: &str, secret: &[u8]) -> StoreResult<()> {
            let entry = entry("store", service, account)?;

            // Access policy is fixed when an item is created, so replace
            // rather than update.
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => debug!(service, error = %e, "Failed to remove existing item"),
            }

            entry
                .set_secret(secret)
                .map_err(|e| map_error("store", service, account, e))
        }

        fn retrieve(&self, service: &str, account: &str) -> StoreResult<Vec<u8>> {
            entry("retrieve", service, account)?
                .get_secret()
                .map_err(|e| map_error("retrieve", service, account, e))
        }

        fn delete(&self, service: &str, account: &str) -> StoreResult<()> {
            entry("delete", service, account)?
                .delete_credential()
                .map_err(|e| map_error("delete", service, account, e))
        }

        fn backend_id(&self) -> &'static str {
            "native"
        }

        fn display_name(&self) -> &'static str {
            "OS secure storage"
        }
    }
}

#[cfg(not(feature = "native-store"))]
impl SecureStore for NativeStore {
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
        "native"
    }

    fn display_name(&self) -> &'static str {
        "OS secure storage (not compiled in)"
    }
}
