//! Resolved credential values.
//!
//! Secrets are held as `secrecy` types so they are redacted in `Debug`
//! output and zeroed on drop. Callers that expose them own the copy.

use secrecy::{ExposeSecret, SecretSlice, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::kind::CredentialKind;

/// Gateway used when no SSH gateway is configured
pub const DEFAULT_SSH_GATEWAY: &str = "gateway.credchain.dev";

/// Service API credentials plus the SSH identity paired with them
///
/// `ssh_user` falls back to `api_user` and `ssh_gateway` falls back to
/// [`DEFAULT_SSH_GATEWAY`] when absent or empty.
#[derive(Debug, Clone)]
pub struct ServiceApiCredentials {
    api_user: String,
    api_password: SecretString,
    ssh_user: String,
    ssh_gateway: String,
}

impl ServiceApiCredentials {
    /// Creates credentials, applying the `ssh_user` and `ssh_gateway` defaults
    #[must_use]
    pub fn new(
        api_user: impl Into<String>,
        api_password: impl Into<String>,
        ssh_user: Option<String>,
        ssh_gateway: Option<String>,
    ) -> Self {
        let api_user = api_user.into();
        let ssh_user = non_empty(ssh_user).unwrap_or_else(|| api_user.clone());
        let ssh_gateway =
            non_empty(ssh_gateway).unwrap_or_else(|| DEFAULT_SSH_GATEWAY.to_string());
        Self {
            api_user,
            api_password: SecretString::from(api_password.into()),
            ssh_user,
            ssh_gateway,
        }
    }

    /// API user name
    #[must_use]
    pub fn api_user(&self) -> &str {
        &self.api_user
    }

    /// Exposes the API password
    #[must_use]
    pub fn expose_password(&self) -> &str {
        self.api_password.expose_secret()
    }

    /// SSH user name
    #[must_use]
    pub fn ssh_user(&self) -> &str {
        &self.ssh_user
    }

    /// SSH gateway host, optionally with `:port`
    #[must_use]
    pub fn ssh_gateway(&self) -> &str {
        &self.ssh_gateway
    }

    pub(crate) fn to_stored(&self) -> StoredApiCredentials {
        StoredApiCredentials {
            api_user: self.api_user.clone(),
            api_password: self.api_password.expose_secret().to_string(),
            ssh_user: Some(self.ssh_user.clone()),
            ssh_gateway: Some(self.ssh_gateway.clone()),
        }
    }
}

/// Plain form of [`ServiceApiCredentials`] kept in native storage as JSON
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredApiCredentials {
    pub api_user: String,
    pub api_password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_gateway: Option<String>,
}

impl StoredApiCredentials {
    /// Converts to credentials if both required fields are non-empty
    pub fn into_credentials(self) -> Option<ServiceApiCredentials> {
        if self.api_user.is_empty() || self.api_password.is_empty() {
            return None;
        }
        Some(ServiceApiCredentials::new(
            self.api_user,
            self.api_password,
            self.ssh_user,
            self.ssh_gateway,
        ))
    }
}

/// Opaque access token
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Wraps a token string
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Exposes the token
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Length of the token in characters, for redacted display
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.expose_secret().chars().count()
    }

    /// Whether the token is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

/// SSH private key material
#[derive(Debug)]
pub struct SshPrivateKey {
    material: SecretSlice<u8>,
    path: Option<PathBuf>,
}

impl SshPrivateKey {
    /// Wraps key bytes, remembering the file they were read from
    #[must_use]
    pub fn new(material: Vec<u8>, path: Option<PathBuf>) -> Self {
        Self {
            material: SecretSlice::from(material),
            path,
        }
    }

    /// Exposes the raw key bytes
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.material.expose_secret()
    }

    /// File the key was read from; `None` when it came from native storage
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Any resolved credential
#[derive(Debug)]
pub enum Credential {
    /// SSH private key
    SshKey(SshPrivateKey),
    /// Service API credentials
    ServiceApi(ServiceApiCredentials),
    /// Access token
    AccessToken(AccessToken),
}

impl Credential {
    /// The kind of this credential
    #[must_use]
    pub const fn kind(&self) -> CredentialKind {
        match self {
            Self::SshKey(_) => CredentialKind::SshKey,
            Self::ServiceApi(_) => CredentialKind::ServiceApi,
            Self::AccessToken(_) => CredentialKind::AccessToken,
        }
    }

    /// One-line description that never includes secret material
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::SshKey(key) => match key.path() {
                Some(path) => format!(
                    "private key at {} ({} bytes)",
                    path.display(),
                    key.expose().len()
                ),
                None => format!("private key ({} bytes)", key.expose().len()),
            },
            Self::ServiceApi(creds) => format!(
                "api_user={} ssh_user={} ssh_gateway={}",
                creds.api_user(),
                creds.ssh_user(),
                creds.ssh_gateway()
            ),
            Self::AccessToken(token) => format!("token ({} characters)", token.len()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
