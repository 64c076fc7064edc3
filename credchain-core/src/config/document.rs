//! Credentials document model
//!
//! This module defines the per-user credentials document stored in
//! `credentials.toml`. It has one optional section per credential kind.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{CredentialKind, ServiceApiCredentials};

/// The on-disk credentials document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Service API credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_api: Option<ServiceApiSection>,
    /// Access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessTokenSection>,
    /// SSH private key location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<SshKeySection>,
}

/// `[service_api]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceApiSection {
    /// API user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_user: Option<String>,
    /// API password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_password: Option<String>,
    /// SSH user; defaults to `api_user`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    /// SSH gateway; defaults to the built-in gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_gateway: Option<String>,
}

/// `[access_token]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenSection {
    /// The token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// `[ssh_key]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeySection {
    /// Path to the private key; `~` is expanded against the home directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,
}

impl ConfigDocument {
    /// Service API credentials, if both user and password are non-empty
    #[must_use]
    pub fn service_api_credentials(&self) -> Option<ServiceApiCredentials> {
        let section = self.service_api.as_ref()?;
        let user = non_empty(section.api_user.as_deref())?;
        let password = non_empty(section.api_password.as_deref())?;
        Some(ServiceApiCredentials::new(
            user,
            password,
            section.ssh_user.clone(),
            section.ssh_gateway.clone(),
        ))
    }

    /// The access token, if non-empty
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        non_empty(self.access_token.as_ref()?.token.as_deref())
    }

    /// The configured private key path, if non-empty
    #[must_use]
    pub fn private_key_path(&self) -> Option<&str> {
        non_empty(self.ssh_key.as_ref()?.private_key_path.as_deref())
    }

    /// Which required fields of a kind's section are missing or empty
    #[must_use]
    pub fn missing_fields(&self, kind: CredentialKind) -> Vec<&'static str> {
        match kind {
            CredentialKind::ServiceApi => {
                let section = self.service_api.clone().unwrap_or_default();
                let mut missing = Vec::new();
                if non_empty(section.api_user.as_deref()).is_none() {
                    missing.push("api_user");
                }
                if non_empty(section.api_password.as_deref()).is_none() {
                    missing.push("api_password");
                }
                missing
            }
            CredentialKind::AccessToken if self.token().is_none() => vec!["token"],
            CredentialKind::SshKey if self.private_key_path().is_none() => {
                vec!["private_key_path"]
            }
            CredentialKind::AccessToken | CredentialKind::SshKey => Vec::new(),
        }
    }

    /// Replaces the `[service_api]` section
    pub fn set_service_api(&mut self, credentials: &ServiceApiCredentials) {
        self.service_api = Some(ServiceApiSection {
            api_user: Some(credentials.api_user().to_string()),
            api_password: Some(credentials.expose_password().to_string()),
            ssh_user: Some(credentials.ssh_user().to_string()),
            ssh_gateway: Some(credentials.ssh_gateway().to_string()),
        });
    }

    /// Replaces the `[access_token]` section
    pub fn set_token(&mut self, token: &str) {
        self.access_token = Some(AccessTokenSection {
            token: Some(token.to_string()),
        });
    }

    /// Replaces the `[ssh_key]` section
    pub fn set_private_key_path(&mut self, path: &Path) {
        self.ssh_key = Some(SshKeySection {
            private_key_path: Some(path.to_string_lossy().into_owned()),
        });
    }

    /// Removes the section belonging to `kind`; returns whether it existed
    pub fn clear(&mut self, kind: CredentialKind) -> bool {
        match kind {
            CredentialKind::ServiceApi => self.service_api.take().is_some(),
            CredentialKind::AccessToken => self.access_token.take().is_some(),
            CredentialKind::SshKey => self.ssh_key.take().is_some(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
