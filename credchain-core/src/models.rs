//! Core data models for `credchain`
//!
//! This module defines the credential kinds and sources that drive
//! resolution, the resolved credential values, and the per-source
//! attempt records returned to callers.

mod attempt;
mod credentials;
mod kind;

pub use attempt::{AttemptOutcome, Resolved, ResolutionAttempt};
pub use credentials::{
    AccessToken, Credential, ServiceApiCredentials, SshPrivateKey, DEFAULT_SSH_GATEWAY,
};
pub(crate) use credentials::StoredApiCredentials;
pub use kind::{
    CredentialKind, CredentialSource, ParseKindError, ACCESS_TOKEN_ENV, API_PASSWORD_ENV,
    API_USER_ENV, SSH_GATEWAY_ENV, SSH_KEY_ENV_VARS, SSH_USER_ENV,
};
