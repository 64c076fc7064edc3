//! Credential resolution chain
//!
//! This module provides the `FallbackResolver`, which resolves each
//! credential kind by consulting sources in a fixed order:
//!
//! 1. Native secure storage, when the capability probe says it works
//! 2. Environment variables
//! 3. The credentials file (`~/.credchain/credentials.toml`)
//! 4. Default key locations (SSH keys only)
//!
//! The first usable value wins. When every source comes up empty the
//! caller gets a `ResolveError::NotFound` listing what was tried.

mod lookup;
mod trail;

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::config::{ConfigDocument, ConfigFileStore};
use crate::env::{EnvSource, ProcessEnv};
use crate::error::{ConfigError, ResolveError, ResolveResult, StoreError};
use crate::models::{
    AccessToken, AttemptOutcome, Credential, CredentialKind, CredentialSource, Resolved,
    ServiceApiCredentials, SshPrivateKey,
};
use crate::paths::CredentialPaths;
use crate::secret::{platform_store, SecureStore};
use crate::validator::looks_like_private_key;

use lookup::{AccessTokenLookup, Lookup, ServiceApiLookup, SshKeyLookup};
use trail::Trail;

/// Account identifier used for native storage items unless overridden
pub const DEFAULT_ACCOUNT: &str = "default";

/// Where the resolver looks for files and which account it uses
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Home-relative paths (credentials file, default keys)
    pub paths: CredentialPaths,
    /// Native storage account identifier
    pub account: String,
}

impl ResolverConfig {
    /// Creates a configuration rooted at the given paths
    #[must_use]
    pub fn new(paths: CredentialPaths) -> Self {
        Self {
            paths,
            account: DEFAULT_ACCOUNT.to_string(),
        }
    }

    /// Creates a configuration rooted at the current user's home directory
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn from_home_dir() -> Option<Self> {
        CredentialPaths::from_home_dir().map(Self::new)
    }

    /// Uses a different native storage account
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }
}

/// Resolves credentials through the native store, environment, credentials
/// file and default locations, in that order
///
/// The capability probe runs once per resolver. Later resolve and save calls
/// reuse its answer until [`FallbackResolver::recheck_native_storage`].
pub struct FallbackResolver {
    store: Arc<dyn SecureStore>,
    env: Arc<dyn EnvSource>,
    config: ResolverConfig,
    files: ConfigFileStore,
    native_available: Mutex<Option<bool>>,
}

impl std::fmt::Debug for FallbackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResolver")
            .field("store", &self.store.backend_id())
            .field("config", &self.config)
            .field("native_available", &self.cached_probe())
            .finish_non_exhaustive()
    }
}

impl FallbackResolver {
    /// Creates a resolver from explicit collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn SecureStore>,
        env: Arc<dyn EnvSource>,
        config: ResolverConfig,
    ) -> Self {
        let files = ConfigFileStore::from_paths(&config.paths);
        Self {
            store,
            env,
            config,
            files,
            native_available: Mutex::new(None),
        }
    }

    /// Creates a resolver using the platform store and the process environment
    #[must_use]
    pub fn with_platform_defaults(config: ResolverConfig) -> Self {
        Self::new(platform_store(), Arc::new(ProcessEnv), config)
    }

    /// Whether native storage is usable, probing on first call
    pub fn native_available(&self) -> bool {
        let mut cached = self.probe_slot();
        *cached.get_or_insert_with(|| self.probe())
    }

    /// Discards the cached capability answer and probes again
    pub fn recheck_native_storage(&self) -> bool {
        let mut cached = self.probe_slot();
        let available = self.probe();
        *cached = Some(available);
        available
    }

    fn probe(&self) -> bool {
        let available = self.store.is_available();
        info!(
            backend = self.store.backend_id(),
            available, "Secure storage capability probed"
        );
        available
    }

    fn probe_slot(&self) -> std::sync::MutexGuard<'_, Option<bool>> {
        self.native_available
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cached_probe(&self) -> Option<bool> {
        *self.probe_slot()
    }

    /// The secure store this resolver reads and writes
    #[must_use]
    pub fn store(&self) -> &dyn SecureStore {
        self.store.as_ref()
    }

    /// The environment this resolver reads
    #[must_use]
    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    /// Paths and account in use
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Home-relative paths in use
    #[must_use]
    pub const fn paths(&self) -> &CredentialPaths {
        &self.config.paths
    }

    /// The credentials file
    #[must_use]
    pub const fn files(&self) -> &ConfigFileStore {
        &self.files
    }

    /// Resolves the SSH private key
    ///
    /// # Errors
    /// Returns `ResolveError::NotFound` if no source yields a valid key
    #[tracing::instrument(skip(self))]
    pub fn resolve_ssh_key(&self) -> ResolveResult<Resolved<SshPrivateKey>> {
        self.resolve_with::<SshKeyLookup>()
    }

    /// Resolves the service API credentials
    ///
    /// # Errors
    /// Returns `ResolveError::NotFound` if no source yields both a user and
    /// a password
    #[tracing::instrument(skip(self))]
    pub fn resolve_service_api(&self) -> ResolveResult<Resolved<ServiceApiCredentials>> {
        self.resolve_with::<ServiceApiLookup>()
    }

    /// Resolves the access token
    ///
    /// # Errors
    /// Returns `ResolveError::NotFound` if no source yields a non-empty token
    #[tracing::instrument(skip(self))]
    pub fn resolve_token(&self) -> ResolveResult<Resolved<AccessToken>> {
        self.resolve_with::<AccessTokenLookup>()
    }

    /// Resolves any credential kind
    ///
    /// # Errors
    /// Returns `ResolveError::NotFound` if every source is exhausted
    pub fn resolve(&self, kind: CredentialKind) -> ResolveResult<Resolved<Credential>> {
        match kind {
            CredentialKind::SshKey => self
                .resolve_ssh_key()
                .map(|resolved| resolved.map(Credential::SshKey)),
            CredentialKind::ServiceApi => self
                .resolve_service_api()
                .map(|resolved| resolved.map(Credential::ServiceApi)),
            CredentialKind::AccessToken => self
                .resolve_token()
                .map(|resolved| resolved.map(Credential::AccessToken)),
        }
    }

    fn resolve_with<L: Lookup>(&self) -> ResolveResult<Resolved<L::Value>> {
        let kind = L::KIND;
        let mut trail = Trail::new(kind);

        let native = format!("Native secure storage ({})", kind.namespace());
        if self.native_available() {
            match self.store.retrieve(kind.namespace(), &self.config.account) {
                Ok(bytes) if bytes.is_empty() => trail.record(
                    CredentialSource::NativeStore,
                    native,
                    AttemptOutcome::Missing,
                    Some("stored item is empty".to_string()),
                ),
                Ok(bytes) => match L::decode_native(bytes) {
                    Ok(value) => {
                        return Ok(trail.found(CredentialSource::NativeStore, native, value));
                    }
                    Err(reason) => trail.record(
                        CredentialSource::NativeStore,
                        native,
                        AttemptOutcome::Invalid,
                        Some(reason),
                    ),
                },
                Err(e) => {
                    let outcome = match e {
                        StoreError::NotFound { .. } => AttemptOutcome::Missing,
                        StoreError::Unavailable(_) => AttemptOutcome::Unavailable,
                        StoreError::Backend(_) => AttemptOutcome::Failed,
                    };
                    trail.record(
                        CredentialSource::NativeStore,
                        native,
                        outcome,
                        Some(e.to_string()),
                    );
                }
            }
        } else {
            trail.record(
                CredentialSource::NativeStore,
                native,
                AttemptOutcome::Unavailable,
                None,
            );
        }

        if let Some((description, value)) = L::from_env(self, &mut trail) {
            return Ok(trail.found(CredentialSource::EnvironmentVariable, description, value));
        }

        let file = format!("Credentials file {}", self.files.path().display());
        match self.files.load() {
            Ok(document) => match L::from_config(self, &document) {
                Ok(value) => return Ok(trail.found(CredentialSource::ConfigFile, file, value)),
                Err(rejection) => trail.record(
                    CredentialSource::ConfigFile,
                    file,
                    rejection.outcome,
                    Some(rejection.reason),
                ),
            },
            Err(e) => {
                let outcome = if matches!(e, ConfigError::Missing(_)) {
                    AttemptOutcome::Missing
                } else {
                    AttemptOutcome::Failed
                };
                trail.record(CredentialSource::ConfigFile, file, outcome, Some(e.to_string()));
            }
        }

        if let Some((description, value)) = L::from_defaults(self, &mut trail) {
            return Ok(trail.found(CredentialSource::DefaultLocation, description, value));
        }

        let err = trail.exhausted();
        warn!(kind = %kind, error = %err, "Credential resolution exhausted all sources");
        Err(err)
    }

    /// Saves an access token
    ///
    /// Writes to native storage when available, otherwise (or if that write
    /// fails) to the credentials file.
    ///
    /// # Errors
    /// Returns `ResolveError::Persist` if neither destination accepts the write
    pub fn save_token(&self, token: &AccessToken) -> ResolveResult<CredentialSource> {
        self.persist(
            CredentialKind::AccessToken,
            token.expose().as_bytes(),
            |document| document.set_token(token.expose()),
        )
    }

    /// Saves service API credentials
    ///
    /// # Errors
    /// Returns `ResolveError::Persist` if neither destination accepts the write
    pub fn save_service_api(
        &self,
        credentials: &ServiceApiCredentials,
    ) -> ResolveResult<CredentialSource> {
        let kind = CredentialKind::ServiceApi;
        let blob = serde_json::to_vec(&credentials.to_stored()).map_err(|e| {
            ResolveError::Persist {
                kind,
                reason: format!("failed to encode credentials: {e}"),
            }
        })?;
        self.persist(kind, &blob, |document| {
            document.set_service_api(credentials);
        })
    }

    /// Saves an SSH private key
    ///
    /// The key file must pass the private key check. Native storage keeps
    /// the key material; the credentials file keeps the path.
    ///
    /// # Errors
    /// Returns `ResolveError::Persist` if the file is not a private key or
    /// neither destination accepts the write
    pub fn save_ssh_key(&self, path: &Path) -> ResolveResult<CredentialSource> {
        let kind = CredentialKind::SshKey;
        let path = self.paths().expand(&path.to_string_lossy());
        if !looks_like_private_key(&path) {
            return Err(ResolveError::Persist {
                kind,
                reason: format!("{} is not a readable private key", path.display()),
            });
        }
        let material = std::fs::read(&path).map_err(|e| ResolveError::Persist {
            kind,
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        self.persist(kind, &material, |document| {
            document.set_private_key_path(&path);
        })
    }

    fn persist(
        &self,
        kind: CredentialKind,
        secret: &[u8],
        update: impl FnOnce(&mut ConfigDocument),
    ) -> ResolveResult<CredentialSource> {
        if self.native_available() {
            match self
                .store
                .store(kind.namespace(), &self.config.account, secret)
            {
                Ok(()) => {
                    info!(
                        kind = %kind,
                        backend = self.store.backend_id(),
                        "Credential saved to secure storage"
                    );
                    return Ok(CredentialSource::NativeStore);
                }
                Err(e) => {
                    warn!(
                        kind = %kind,
                        error = %e,
                        "Secure storage write failed, using credentials file"
                    );
                }
            }
        }

        let to_persist = |e: ConfigError| ResolveError::Persist {
            kind,
            reason: e.to_string(),
        };
        let mut document = self.files.load_or_default().map_err(to_persist)?;
        update(&mut document);
        self.files.save(&document).map_err(to_persist)?;
        info!(
            kind = %kind,
            path = %self.files.path().display(),
            "Credential saved to credentials file"
        );
        Ok(CredentialSource::ConfigFile)
    }

    /// Removes a saved credential from native storage and the credentials file
    ///
    /// Returns the destinations an item was actually removed from.
    /// Environment variables and default key files are never touched.
    ///
    /// # Errors
    /// Returns `ResolveError::Persist` if the credentials file cannot be
    /// read or rewritten
    pub fn forget(&self, kind: CredentialKind) -> ResolveResult<Vec<CredentialSource>> {
        let mut removed = Vec::new();

        if self.native_available() {
            match self.store.delete(kind.namespace(), &self.config.account) {
                Ok(()) => removed.push(CredentialSource::NativeStore),
                Err(StoreError::NotFound { .. }) => {}
                Err(e) => warn!(kind = %kind, error = %e, "Failed to delete secure storage item"),
            }
        }

        if self.files.exists() {
            let to_persist = |e: ConfigError| ResolveError::Persist {
                kind,
                reason: e.to_string(),
            };
            let mut document = self.files.load().map_err(to_persist)?;
            if document.clear(kind) {
                self.files.save(&document).map_err(to_persist)?;
                removed.push(CredentialSource::ConfigFile);
            }
        }

        debug!(kind = %kind, removed = removed.len(), "Credential forgotten");
        Ok(removed)
    }
}
