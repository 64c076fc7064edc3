//! `credchain` Core Library
//!
//! This crate resolves the credentials a deployment tool needs (an SSH
//! private key, service API credentials and an access token) from native
//! secure storage, environment variables, a per-user credentials file and
//! default key locations, and reports on their health.

pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod models;
pub mod paths;
pub mod resolver;
pub mod secret;
pub mod validator;

pub use config::{ConfigDocument, ConfigFileStore};
pub use diagnostics::{
    DiagnosticReport, DiagnosticResult, DiagnosticStatus, DiagnosticsAggregator,
    DiagnosticsOptions,
};
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{
    ConfigError, ConfigResult, CredChainError, ResolveError, ResolveResult, StoreError,
    StoreResult,
};
pub use models::{
    AccessToken, AttemptOutcome, Credential, CredentialKind, CredentialSource,
    ResolutionAttempt, Resolved, ServiceApiCredentials, SshPrivateKey,
};
pub use paths::CredentialPaths;
pub use resolver::{FallbackResolver, ResolverConfig, DEFAULT_ACCOUNT};
pub use secret::{
    platform_store, CapabilityProbe, MemoryStore, NativeStore, SecureStore, UnavailableStore,
};
pub use validator::looks_like_private_key;
