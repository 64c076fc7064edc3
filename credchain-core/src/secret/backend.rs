//! Secure storage trait definition
//!
//! This module defines the `SecureStore` trait that every secure storage
//! variant implements.

use crate::error::StoreResult;

use super::probe::CapabilityProbe;

/// Abstraction over secure storage backends
///
/// Items are addressed by a service namespace and an account identifier.
/// Callers always hold some `SecureStore`; on platforms without native
/// support they hold one whose operations fail with `Unavailable`.
pub trait SecureStore: Send + Sync {
    /// Store a secret, replacing any existing item for the same key
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the backend cannot be used, or
    /// `StoreError::Backend` if the write is rejected
    fn store(&self, service: &str, account: &str, secret: &[u8]) -> StoreResult<()>;

    /// Retrieve a secret
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if no item matches, or
    /// `StoreError::Unavailable` / `StoreError::Backend` on backend failure
    fn retrieve(&self, service: &str, account: &str) -> StoreResult<Vec<u8>>;

    /// Delete a secret
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if no item matches, or
    /// `StoreError::Unavailable` / `StoreError::Backend` on backend failure
    fn delete(&self, service: &str, account: &str) -> StoreResult<()>;

    /// Returns the backend identifier (e.g., "native", "unavailable")
    fn backend_id(&self) -> &'static str;

    /// Returns a human-readable name for this backend
    fn display_name(&self) -> &'static str;

    /// Check whether the backend is usable by running a canary round trip
    ///
    /// This writes, reads and deletes a throwaway item.
    fn is_available(&self) -> bool {
        CapabilityProbe::check(self)
    }
}
