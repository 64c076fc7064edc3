//! Secure storage for `credchain`
//!
//! This module provides the `SecureStore` abstraction and its variants:
//! - `NativeStore` for the OS keyring (when compiled with `native-store`)
//! - `UnavailableStore`, which always fails with `Unavailable`
//! - `MemoryStore` for tests and embedding
//!
//! [`platform_store`] picks the variant once, so the resolver never
//! branches on platform capability.

mod backend;
mod memory;
mod native;
mod probe;
mod unavailable;

use std::sync::Arc;

pub use backend::SecureStore;
pub use memory::MemoryStore;
pub use native::NativeStore;
pub use probe::{CapabilityProbe, PROBE_NAMESPACE};
pub use unavailable::UnavailableStore;

/// Returns the secure store appropriate for this build
#[must_use]
pub fn platform_store() -> Arc<dyn SecureStore> {
    if NativeStore::compiled_in() {
        Arc::new(NativeStore::new())
    } else {
        Arc::new(UnavailableStore)
    }
}
