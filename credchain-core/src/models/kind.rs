//! Credential kinds and the sources they are resolved from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variables holding a path to an SSH private key, in lookup order
pub const SSH_KEY_ENV_VARS: &[&str] = &["CREDCHAIN_SSH_KEY_PATH", "SSH_PRIVATE_KEY_PATH"];

/// Environment variable holding the service API user
pub const API_USER_ENV: &str = "CREDCHAIN_API_USER";
/// Environment variable holding the service API password
pub const API_PASSWORD_ENV: &str = "CREDCHAIN_API_PASSWORD";
/// Optional override for the SSH user paired with the service API credentials
pub const SSH_USER_ENV: &str = "CREDCHAIN_SSH_USER";
/// Optional override for the SSH gateway paired with the service API credentials
pub const SSH_GATEWAY_ENV: &str = "CREDCHAIN_SSH_GATEWAY";

/// Environment variable holding the access token
pub const ACCESS_TOKEN_ENV: &str = "GITHUB_TOKEN";

const SERVICE_API_ENV_VARS: &[&str] = &[API_USER_ENV, API_PASSWORD_ENV, SSH_USER_ENV, SSH_GATEWAY_ENV];
const ACCESS_TOKEN_ENV_VARS: &[&str] = &[ACCESS_TOKEN_ENV];

/// The closed set of credential kinds `credchain` can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    /// SSH private key material
    SshKey,
    /// Service API user/password plus SSH user and gateway
    ServiceApi,
    /// Opaque access token
    AccessToken,
}

impl CredentialKind {
    /// All kinds, in the order diagnostics report them
    pub const ALL: [Self; 3] = [Self::ServiceApi, Self::SshKey, Self::AccessToken];

    /// Native secure-storage service namespace for this kind
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::SshKey => "credchain.ssh-key",
            Self::ServiceApi => "credchain.service-api",
            Self::AccessToken => "credchain.github-token",
        }
    }

    /// Section name of this kind in the credentials file
    #[must_use]
    pub const fn config_section(self) -> &'static str {
        match self {
            Self::SshKey => "ssh_key",
            Self::ServiceApi => "service_api",
            Self::AccessToken => "access_token",
        }
    }

    /// Every environment variable consulted for this kind, in lookup order
    #[must_use]
    pub const fn env_vars(self) -> &'static [&'static str] {
        match self {
            Self::SshKey => SSH_KEY_ENV_VARS,
            Self::ServiceApi => SERVICE_API_ENV_VARS,
            Self::AccessToken => ACCESS_TOKEN_ENV_VARS,
        }
    }

    /// Command-line identifier (`ssh-key`, `service-api`, `access-token`)
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::SshKey => "ssh-key",
            Self::ServiceApi => "service-api",
            Self::AccessToken => "access-token",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SshKey => "SSH key",
            Self::ServiceApi => "service API credentials",
            Self::AccessToken => "access token",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown credential kind
#[derive(Debug, Error)]
#[error("unknown credential kind: {0} (expected ssh-key, service-api or access-token)")]
pub struct ParseKindError(String);

impl FromStr for CredentialKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "ssh-key" | "ssh" => Ok(Self::SshKey),
            "service-api" | "api" => Ok(Self::ServiceApi),
            "access-token" | "token" => Ok(Self::AccessToken),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Where a credential can come from
///
/// The derived ordering is the fixed precedence used by the resolver:
/// native store first, default key locations last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// OS secure storage (Keychain, Credential Manager, kernel keyring)
    NativeStore,
    /// Process environment
    EnvironmentVariable,
    /// The per-user credentials file
    ConfigFile,
    /// Conventional `~/.ssh` key paths (SSH keys only)
    DefaultLocation,
}

impl CredentialSource {
    /// Sources in precedence order
    pub const ORDER: [Self; 4] = [
        Self::NativeStore,
        Self::EnvironmentVariable,
        Self::ConfigFile,
        Self::DefaultLocation,
    ];

    /// Whether this source is consulted for the given kind
    #[must_use]
    pub const fn applies_to(self, kind: CredentialKind) -> bool {
        !matches!(self, Self::DefaultLocation) || matches!(kind, CredentialKind::SshKey)
    }

    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NativeStore => "native secure storage",
            Self::EnvironmentVariable => "environment variable",
            Self::ConfigFile => "credentials file",
            Self::DefaultLocation => "default location",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
