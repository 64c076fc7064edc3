//! Secure storage capability probe
//!
//! Native storage can be compiled in and still be unusable (no keyring
//! daemon, locked keychain, sandbox denial). The probe answers the question
//! empirically: it stores, reads back and deletes a canary item under a
//! random account name so it never touches real entries.

use tracing::debug;
use uuid::Uuid;

use super::backend::SecureStore;

/// Service namespace used for canary items
pub const PROBE_NAMESPACE: &str = "credchain.capability-probe";

const CANARY_SECRET: &[u8] = b"credchain-canary";

/// Determines whether a secure store is usable
pub struct CapabilityProbe;

impl CapabilityProbe {
    /// Generates a fresh canary account name
    #[must_use]
    pub fn canary_account() -> String {
        format!("credchain-probe-{}", Uuid::new_v4().simple())
    }

    /// Runs a store, retrieve, delete cycle against `store`
    ///
    /// Returns `true` when the store and retrieve steps succeed and the
    /// secret reads back unchanged. The canary is always deleted afterwards
    /// and a failed delete never changes the answer.
    pub fn check<S: SecureStore + ?Sized>(store: &S) -> bool {
        let account = Self::canary_account();

        let cycle = store
            .store(PROBE_NAMESPACE, &account, CANARY_SECRET)
            .and_then(|()| store.retrieve(PROBE_NAMESPACE, &account))
            .map(|secret| secret == CANARY_SECRET);

        match cycle {
            Ok(true) => {
                debug!(backend = store.backend_id(), "Secure storage available");
                Self::cleanup(store, &account);
                true
            }
            Ok(false) => {
                debug!(backend = store.backend_id(), "Canary read back different bytes");
                Self::cleanup(store, &account);
                false
            }
            Err(e) => {
                debug!(backend = store.backend_id(), error = %e, "Secure storage unavailable");
                Self::cleanup(store, &account);
                false
            }
        }
    }

    fn cleanup<S: SecureStore + ?Sized>(store: &S, account: &str) {
        if let Err(e) = store.delete(PROBE_NAMESPACE, account) {
            debug!(error = %e, "Canary cleanup failed");
        }
    }
}
