//! Per-kind lookup rules
//!
//! The resolver walks the same precedence chain for every kind; each
//! [`Lookup`] implementation says how one kind decodes native-store bytes,
//! which environment variables it reads, which credentials file section it
//! needs, and (SSH keys only) which default files it scans.

use std::fs;
use std::path::Path;

use crate::config::ConfigDocument;
use crate::models::{
    AccessToken, AttemptOutcome, CredentialKind, CredentialSource, ServiceApiCredentials,
    SshPrivateKey, StoredApiCredentials, ACCESS_TOKEN_ENV, API_PASSWORD_ENV, API_USER_ENV,
    SSH_GATEWAY_ENV, SSH_KEY_ENV_VARS, SSH_USER_ENV,
};
use crate::validator::{bytes_look_like_private_key, looks_like_private_key};

use super::trail::Trail;
use super::FallbackResolver;

/// Why a source's value was not accepted
pub(super) struct Rejection {
    pub outcome: AttemptOutcome,
    pub reason: String,
}

impl Rejection {
    fn missing(reason: impl Into<String>) -> Self {
        Self {
            outcome: AttemptOutcome::Missing,
            reason: reason.into(),
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            outcome: AttemptOutcome::Invalid,
            reason: reason.into(),
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            outcome: AttemptOutcome::Failed,
            reason: reason.into(),
        }
    }
}

/// How one credential kind is read from each source
pub(super) trait Lookup {
    type Value;

    const KIND: CredentialKind;

    /// Decodes a non-empty native-store item
    fn decode_native(bytes: Vec<u8>) -> Result<Self::Value, String>;

    /// Consults the kind's environment variables in order, recording misses
    ///
    /// Returns the winning source description and value.
    fn from_env(resolver: &FallbackResolver, trail: &mut Trail) -> Option<(String, Self::Value)>;

    /// Extracts the kind's section from a loaded credentials document
    fn from_config(
        resolver: &FallbackResolver,
        document: &ConfigDocument,
    ) -> Result<Self::Value, Rejection>;

    /// Scans default file locations, recording misses
    fn from_defaults(
        _resolver: &FallbackResolver,
        _trail: &mut Trail,
    ) -> Option<(String, Self::Value)> {
        None
    }
}

fn env_description(name: &str) -> String {
    format!("Environment variable {name}")
}

fn read_key(path: &Path) -> Result<SshPrivateKey, Rejection> {
    if !looks_like_private_key(path) {
        return Err(Rejection::invalid(format!(
            "{} is not a readable private key",
            path.display()
        )));
    }
    fs::read(path)
        .map(|bytes| SshPrivateKey::new(bytes, Some(path.to_path_buf())))
        .map_err(|e| Rejection::failed(format!("Failed to read {}: {e}", path.display())))
}

pub(super) struct SshKeyLookup;

impl Lookup for SshKeyLookup {
    type Value = SshPrivateKey;

    const KIND: CredentialKind = CredentialKind::SshKey;

    fn decode_native(bytes: Vec<u8>) -> Result<Self::Value, String> {
        if bytes_look_like_private_key(&bytes) {
            Ok(SshPrivateKey::new(bytes, None))
        } else {
            Err("stored item does not contain a private key".to_string())
        }
    }

    fn from_env(resolver: &FallbackResolver, trail: &mut Trail) -> Option<(String, Self::Value)> {
        for name in SSH_KEY_ENV_VARS {
            let description = env_description(name);
            let Some(raw) = resolver.env().non_empty(name) else {
                trail.record(
                    CredentialSource::EnvironmentVariable,
                    description,
                    AttemptOutcome::Missing,
                    None,
                );
                continue;
            };

            match read_key(&resolver.paths().expand(&raw)) {
                Ok(key) => return Some((description, key)),
                Err(rejection) => trail.record(
                    CredentialSource::EnvironmentVariable,
                    description,
                    rejection.outcome,
                    Some(rejection.reason),
                ),
            }
        }
        None
    }

    fn from_config(
        resolver: &FallbackResolver,
        document: &ConfigDocument,
    ) -> Result<Self::Value, Rejection> {
        let raw = document
            .private_key_path()
            .ok_or_else(|| Rejection::missing("no private_key_path in [ssh_key]"))?;
        read_key(&resolver.paths().expand(raw))
    }

    fn from_defaults(
        resolver: &FallbackResolver,
        trail: &mut Trail,
    ) -> Option<(String, Self::Value)> {
        for path in resolver.paths().default_key_paths() {
            let description = format!("Default key location {}", path.display());
            if !path.exists() {
                trail.record(
                    CredentialSource::DefaultLocation,
                    description,
                    AttemptOutcome::Missing,
                    None,
                );
                continue;
            }

            match read_key(&path) {
                Ok(key) => return Some((description, key)),
                Err(rejection) => trail.record(
                    CredentialSource::DefaultLocation,
                    description,
                    rejection.outcome,
                    Some(rejection.reason),
                ),
            }
        }
        None
    }
}

pub(super) struct ServiceApiLookup;

impl Lookup for ServiceApiLookup {
    type Value = ServiceApiCredentials;

    const KIND: CredentialKind = CredentialKind::ServiceApi;

    fn decode_native(bytes: Vec<u8>) -> Result<Self::Value, String> {
        let stored: StoredApiCredentials = serde_json::from_slice(&bytes)
            .map_err(|e| format!("stored item is not valid credentials JSON: {e}"))?;
        stored
            .into_credentials()
            .ok_or_else(|| "stored item has an empty user or password".to_string())
    }

    fn from_env(resolver: &FallbackResolver, trail: &mut Trail) -> Option<(String, Self::Value)> {
        let env = resolver.env();
        let description = format!("Environment variables {API_USER_ENV}/{API_PASSWORD_ENV}");

        match (env.non_empty(API_USER_ENV), env.non_empty(API_PASSWORD_ENV)) {
            (Some(user), Some(password)) => {
                let credentials = ServiceApiCredentials::new(
                    user,
                    password,
                    env.non_empty(SSH_USER_ENV),
                    env.non_empty(SSH_GATEWAY_ENV),
                );
                Some((description, credentials))
            }
            (None, None) => {
                trail.record(
                    CredentialSource::EnvironmentVariable,
                    description,
                    AttemptOutcome::Missing,
                    None,
                );
                None
            }
            (user, _) => {
                let unset = if user.is_some() {
                    API_PASSWORD_ENV
                } else {
                    API_USER_ENV
                };
                trail.record(
                    CredentialSource::EnvironmentVariable,
                    description,
                    AttemptOutcome::Invalid,
                    Some(format!("{unset} is not set")),
                );
                None
            }
        }
    }

    fn from_config(
        _resolver: &FallbackResolver,
        document: &ConfigDocument,
    ) -> Result<Self::Value, Rejection> {
        if let Some(credentials) = document.service_api_credentials() {
            return Ok(credentials);
        }
        if document.service_api.is_none() {
            return Err(Rejection::missing("no [service_api] section"));
        }
        Err(Rejection::invalid(format!(
            "[service_api] is missing {}",
            document.missing_fields(Self::KIND).join(", ")
        )))
    }
}

pub(super) struct AccessTokenLookup;

impl Lookup for AccessTokenLookup {
    type Value = AccessToken;

    const KIND: CredentialKind = CredentialKind::AccessToken;

    fn decode_native(bytes: Vec<u8>) -> Result<Self::Value, String> {
        let token = String::from_utf8(bytes)
            .map_err(|_| "stored token is not valid UTF-8".to_string())?;
        if token.trim().is_empty() {
            return Err("stored token is blank".to_string());
        }
        Ok(AccessToken::new(token))
    }

    fn from_env(resolver: &FallbackResolver, trail: &mut Trail) -> Option<(String, Self::Value)> {
        let description = env_description(ACCESS_TOKEN_ENV);
        if let Some(token) = resolver.env().non_empty(ACCESS_TOKEN_ENV) {
            return Some((description, AccessToken::new(token)));
        }
        trail.record(
            CredentialSource::EnvironmentVariable,
            description,
            AttemptOutcome::Missing,
            None,
        );
        None
    }

    fn from_config(
        _resolver: &FallbackResolver,
        document: &ConfigDocument,
    ) -> Result<Self::Value, Rejection> {
        document
            .token()
            .map(AccessToken::new)
            .ok_or_else(|| Rejection::missing("no token in [access_token]"))
    }
}
