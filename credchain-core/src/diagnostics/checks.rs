//! Individual credential health checks
//!
//! Each check reads current state through the resolver's collaborators and
//! returns one [`DiagnosticResult`]. Checks never print secret values.

use std::fs;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{file_mode, SECURE_FILE_MODE};
use crate::error::{ConfigError, ResolveError};
use crate::models::{
    CredentialKind, ACCESS_TOKEN_ENV, API_PASSWORD_ENV, API_USER_ENV, DEFAULT_SSH_GATEWAY,
    SSH_KEY_ENV_VARS,
};
use crate::resolver::FallbackResolver;

use super::report::{DiagnosticResult, DiagnosticStatus, FixPriority};

/// `Secure storage` check name
pub const SECURE_STORAGE: &str = "Secure storage";
/// `Service API credentials` check name
pub const SERVICE_API: &str = "Service API credentials";
/// `SSH key` check name
pub const SSH_KEY: &str = "SSH key";
/// `Access token` check name
pub const ACCESS_TOKEN: &str = "Access token";
/// `Credentials file` check name
pub const CREDENTIALS_FILE: &str = "Credentials file";
/// `Environment variables` check name
pub const ENVIRONMENT: &str = "Environment variables";
/// `Default SSH keys` check name
pub const DEFAULT_KEYS: &str = "Default SSH keys";
/// `SSH gateway reachability` check name
pub const GATEWAY: &str = "SSH gateway reachability";

/// Time limit for the gateway check, shared by every address tried
pub const GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// Port used when the gateway has none
pub const DEFAULT_SSH_PORT: u16 = 22;

const ACCEPTED_KEY_MODES: [u32; 2] = [0o600, 0o400];

pub(super) fn secure_storage(resolver: &FallbackResolver) -> DiagnosticResult {
    let store = resolver.store();
    if resolver.native_available() {
        DiagnosticResult::new(
            SECURE_STORAGE,
            DiagnosticStatus::Ok,
            format!("{} is available", store.display_name()),
        )
    } else {
        DiagnosticResult::new(
            SECURE_STORAGE,
            DiagnosticStatus::Warning,
            "Native secure storage is unavailable; credentials fall back to environment and file",
        )
        .with_detail(format!("Backend: {}", store.display_name()))
    }
}

fn not_found_details(err: &ResolveError) -> Vec<String> {
    let mut details: Vec<String> = err.tried().iter().map(|t| format!("Tried: {t}")).collect();
    if let Some(last) = err.last_error() {
        details.push(format!("Last error: {last}"));
    }
    details
}

pub(super) fn service_api(resolver: &FallbackResolver) -> DiagnosticResult {
    match resolver.resolve_service_api() {
        Ok(resolved) => DiagnosticResult::new(
            SERVICE_API,
            DiagnosticStatus::Ok,
            format!("Found via {}", resolved.description()),
        )
        .with_detail(format!("API user: {}", resolved.value.api_user()))
        .with_detail(format!("SSH user: {}", resolved.value.ssh_user()))
        .with_detail(format!("SSH gateway: {}", resolved.value.ssh_gateway())),
        Err(e) => DiagnosticResult::new(
            SERVICE_API,
            DiagnosticStatus::Error,
            "Service API credentials not found",
        )
        .with_details(not_found_details(&e))
        .with_fix(
            FixPriority::ServiceApi,
            format!(
                "Set {API_USER_ENV} and {API_PASSWORD_ENV}, or run `credchain-cli set-api --user <USER> --password <PASSWORD>`"
            ),
        ),
    }
}

pub(super) fn ssh_key(resolver: &FallbackResolver) -> DiagnosticResult {
    match resolver.resolve_ssh_key() {
        Ok(resolved) => {
            let result = DiagnosticResult::new(
                SSH_KEY,
                DiagnosticStatus::Ok,
                format!("Found via {}", resolved.description()),
            );
            match resolved.value.path() {
                Some(path) => result.with_detail(format!("Key file: {}", path.display())),
                None => result,
            }
        }
        Err(e) => DiagnosticResult::new(
            SSH_KEY,
            DiagnosticStatus::Error,
            "No usable SSH private key found",
        )
        .with_details(not_found_details(&e))
        .with_fix(
            FixPriority::SshKey,
            format!(
                "Set {} to a private key, or run `credchain-cli set-ssh-key <PATH>`",
                SSH_KEY_ENV_VARS[0]
            ),
        ),
    }
}

pub(super) fn access_token(resolver: &FallbackResolver) -> DiagnosticResult {
    match resolver.resolve_token() {
        Ok(resolved) => DiagnosticResult::new(
            ACCESS_TOKEN,
            DiagnosticStatus::Ok,
            format!("Found via {}", resolved.description()),
        ),
        Err(e) => DiagnosticResult::new(
            ACCESS_TOKEN,
            DiagnosticStatus::Warning,
            "No access token configured (optional)",
        )
        .with_details(not_found_details(&e))
        .with_fix(
            FixPriority::AccessToken,
            format!(
                "Optionally set {ACCESS_TOKEN_ENV} or run `credchain-cli set-token` to raise API rate limits"
            ),
        ),
    }
}

pub(super) fn credentials_file(resolver: &FallbackResolver) -> DiagnosticResult {
    let files = resolver.files();
    let path = files.path();
    let location = format!("Path: {}", path.display());

    let document = match files.load() {
        Ok(document) => document,
        Err(ConfigError::Missing(_)) => {
            return DiagnosticResult::new(
                CREDENTIALS_FILE,
                DiagnosticStatus::Warning,
                "Credentials file not found",
            )
            .with_detail(location);
        }
        Err(e @ ConfigError::Malformed { .. }) => {
            return DiagnosticResult::new(
                CREDENTIALS_FILE,
                DiagnosticStatus::Error,
                "Credentials file could not be parsed",
            )
            .with_detail(location)
            .with_detail(e.to_string())
            .with_fix(
                FixPriority::CredentialsFile,
                format!("Fix or remove the malformed credentials file {}", path.display()),
            );
        }
        Err(e) => {
            return DiagnosticResult::new(
                CREDENTIALS_FILE,
                DiagnosticStatus::Error,
                "Credentials file could not be read",
            )
            .with_detail(location)
            .with_detail(e.to_string())
            .with_fix(
                FixPriority::CredentialsFile,
                format!("Make {} readable by the current user", path.display()),
            );
        }
    };

    let sections: Vec<String> = CredentialKind::ALL
        .iter()
        .map(|kind| {
            let missing = document.missing_fields(*kind);
            if missing.is_empty() {
                format!("[{}] complete", kind.config_section())
            } else {
                format!("[{}] missing {}", kind.config_section(), missing.join(", "))
            }
        })
        .collect();

    match files.permission_mode() {
        Ok(Some(mode)) if mode != SECURE_FILE_MODE => DiagnosticResult::new(
            CREDENTIALS_FILE,
            DiagnosticStatus::Warning,
            format!("Credentials file permissions are {mode:o}, expected {SECURE_FILE_MODE:o}"),
        )
        .with_detail(location)
        .with_details(sections)
        .with_fix(
            FixPriority::CredentialsFile,
            format!("Run `chmod 600 {}`", path.display()),
        ),
        Ok(_) => DiagnosticResult::new(
            CREDENTIALS_FILE,
            DiagnosticStatus::Ok,
            "Credentials file is valid",
        )
        .with_detail(location)
        .with_details(sections),
        Err(e) => DiagnosticResult::new(
            CREDENTIALS_FILE,
            DiagnosticStatus::Warning,
            "Credentials file permissions could not be read",
        )
        .with_detail(location)
        .with_detail(e.to_string()),
    }
}

pub(super) fn environment(resolver: &FallbackResolver) -> DiagnosticResult {
    let env = resolver.env();
    let details = CredentialKind::ALL
        .into_iter()
        .flat_map(|kind| kind.env_vars().iter())
        .map(|name| {
            let state = if env.non_empty(name).is_some() {
                "set"
            } else {
                "not set"
            };
            format!("{name}: {state}")
        });

    DiagnosticResult::new(
        ENVIRONMENT,
        DiagnosticStatus::Ok,
        "Environment variables checked",
    )
    .with_details(details)
}

pub(super) fn default_keys(resolver: &FallbackResolver) -> DiagnosticResult {
    let mut details = Vec::new();
    let mut exposed = Vec::new();
    let mut found = 0_usize;

    for path in resolver.paths().default_key_paths() {
        let Ok(metadata) = fs::metadata(&path) else {
            details.push(format!("{}: not found", path.display()));
            continue;
        };
        found += 1;
        match file_mode(&metadata) {
            Some(mode) if !ACCEPTED_KEY_MODES.contains(&mode) => {
                details.push(format!("{}: mode {mode:o} is too open", path.display()));
                exposed.push(path);
            }
            Some(mode) => details.push(format!("{}: mode {mode:o}", path.display())),
            None => details.push(format!("{}: present", path.display())),
        }
    }

    if found == 0 {
        return DiagnosticResult::new(
            DEFAULT_KEYS,
            DiagnosticStatus::Warning,
            format!("No default SSH keys in {}", resolver.paths().ssh_dir().display()),
        )
        .with_details(details)
        .with_fix(
            FixPriority::SshKey,
            "Generate a default key with `ssh-keygen -t ed25519`",
        );
    }

    if !exposed.is_empty() {
        let listed = exposed
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        return DiagnosticResult::new(
            DEFAULT_KEYS,
            DiagnosticStatus::Warning,
            "Some default SSH keys are readable by other users",
        )
        .with_details(details)
        .with_fix(FixPriority::SshKey, format!("Run `chmod 600 {listed}`"));
    }

    DiagnosticResult::new(
        DEFAULT_KEYS,
        DiagnosticStatus::Ok,
        format!("{found} default SSH key(s) with safe permissions"),
    )
    .with_details(details)
}

/// Splits `host[:port]`, defaulting the port to 22
fn split_gateway(gateway: &str) -> (&str, u16) {
    match gateway.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !host.contains(':') => port
            .parse()
            .map_or((gateway, DEFAULT_SSH_PORT), |port| (host, port)),
        _ => (gateway, DEFAULT_SSH_PORT),
    }
}

fn connect(host: &str, port: u16) -> Result<(), String> {
    let deadline = Instant::now() + GATEWAY_TIMEOUT;
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("failed to resolve {host}: {e}"))?
        .collect();
    if addrs.is_empty() {
        return Err(format!("{host} resolved to no addresses"));
    }
    connect_any(&addrs, deadline)
}

/// Tries each address in turn, sharing one deadline across all of them
fn connect_any(addrs: &[SocketAddr], deadline: Instant) -> Result<(), String> {
    let mut last = String::from("no connection attempted");
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(format!("timed out; last error: {last}"));
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(_) => return Ok(()),
            Err(e) => last = format!("{addr}: {e}"),
        }
    }
    Err(last)
}

pub(super) fn gateway(resolver: &FallbackResolver) -> DiagnosticResult {
    let gateway = resolver.resolve_service_api().map_or_else(
        |_| DEFAULT_SSH_GATEWAY.to_string(),
        |resolved| resolved.value.ssh_gateway().to_string(),
    );
    let (host, port) = split_gateway(&gateway);
    debug!(host, port, "Checking SSH gateway reachability");

    match connect(host, port) {
        Ok(()) => DiagnosticResult::new(
            GATEWAY,
            DiagnosticStatus::Ok,
            format!("{host}:{port} is reachable"),
        ),
        Err(reason) => DiagnosticResult::new(
            GATEWAY,
            DiagnosticStatus::Warning,
            format!("{host}:{port} is not reachable"),
        )
        .with_detail(reason),
    }
}
