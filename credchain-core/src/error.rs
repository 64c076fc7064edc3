//! Error types for `credchain`
//!
//! This module defines the error types used throughout the crate: secure
//! storage failures, credentials file failures, and resolution failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::CredentialKind;

/// Top-level error type for `credchain` operations
#[derive(Debug, Error)]
pub enum CredChainError {
    /// Secure storage errors (native keyring or stub)
    #[error("Secure storage error: {0}")]
    Store(#[from] StoreError),

    /// Credentials file errors
    #[error("Credentials file error: {0}")]
    Config(#[from] ConfigError),

    /// Credential resolution errors
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors related to secure storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Native storage is not supported on this platform or build
    #[error("Secure storage unavailable for {0}")]
    Unavailable(String),

    /// No item matches the given service and account
    #[error("No secure storage entry for {service}/{account}")]
    NotFound {
        /// Service namespace that was queried
        service: String,
        /// Account identifier that was queried
        account: String,
    },

    /// The backend rejected the operation
    #[error("Secure storage backend error: {0}")]
    Backend(String),
}

/// Errors related to the on-disk credentials file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The credentials file does not exist
    #[error("Credentials file not found: {0}")]
    Missing(PathBuf),

    /// The credentials file exists but could not be parsed
    #[error("Malformed credentials file {path}: {reason}")]
    Malformed {
        /// Path of the offending file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Filesystem error while reading or writing the credentials file
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the credentials document
    #[error("Failed to serialize credentials: {0}")]
    Serialize(String),
}

impl ConfigError {
    /// Returns true when the file is absent or unparseable
    #[must_use]
    pub const fn is_unusable(&self) -> bool {
        matches!(self, Self::Missing(_) | Self::Malformed { .. })
    }
}

/// Errors related to credential resolution and persistence
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every source was exhausted without finding a usable credential
    #[error("{kind} not found (tried: {})", tried.join(", "))]
    NotFound {
        /// The credential kind being resolved
        kind: CredentialKind,
        /// Human-readable description of each source tried, in order
        tried: Vec<String>,
        /// The most recently observed underlying error, if any
        last_error: Option<String>,
    },

    /// Neither the native store nor the credentials file accepted the write
    #[error("Failed to persist {kind}: {reason}")]
    Persist {
        /// The credential kind being saved
        kind: CredentialKind,
        /// Why the last destination failed
        reason: String,
    },
}

impl ResolveError {
    /// Returns the ordered list of sources tried, if this is a `NotFound` error
    #[must_use]
    pub fn tried(&self) -> &[String] {
        match self {
            Self::NotFound { tried, .. } => tried,
            Self::Persist { .. } => &[],
        }
    }

    /// Returns the last underlying error recorded during resolution
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        match self {
            Self::NotFound { last_error, .. } => last_error.as_deref(),
            Self::Persist { reason, .. } => Some(reason),
        }
    }
}

/// Result type alias for `credchain` operations
pub type Result<T> = std::result::Result<T, CredChainError>;

/// Result type alias for secure storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for credentials file operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for resolution operations
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
