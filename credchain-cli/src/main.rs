//! `credchain` CLI - Command-line interface for credential resolution
//!
//! Provides commands for resolving credentials, running health diagnostics,
//! saving and forgetting credentials, and probing native secure storage.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use credchain_core::diagnostics::{DiagnosticReport, DiagnosticsAggregator, DiagnosticsOptions};
use credchain_core::models::{AccessToken, CredentialKind, CredentialSource, ServiceApiCredentials};
use credchain_core::paths::CredentialPaths;
use credchain_core::resolver::{FallbackResolver, ResolverConfig, DEFAULT_ACCOUNT};
use credchain_core::ResolveError;
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// `credchain` command-line interface for deployment credentials
#[derive(Parser)]
#[command(name = "credchain-cli")]
#[command(author, version, about = "credchain command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Home directory to resolve files against (defaults to the user's home)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Account identifier for native secure storage items
    #[arg(long, global = true, default_value = DEFAULT_ACCOUNT)]
    pub account: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one credential and show where it came from
    #[command(about = "Resolve a credential and print its source")]
    Resolve {
        /// Credential kind (ssh-key, service-api, access-token)
        kind: CredentialKind,

        /// Output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// Run credential health diagnostics
    #[command(about = "Check the health of all credentials")]
    Doctor {
        /// Output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,

        /// Also try a TCP connection to the SSH gateway
        #[arg(long)]
        check_gateway: bool,
    },

    /// Save an access token
    #[command(about = "Save an access token")]
    SetToken {
        /// The token
        token: String,
    },

    /// Save service API credentials
    #[command(about = "Save service API credentials")]
    SetApi {
        /// API user name
        #[arg(short, long)]
        user: String,

        /// API password
        #[arg(short, long)]
        password: String,

        /// SSH user (defaults to the API user)
        #[arg(long)]
        ssh_user: Option<String>,

        /// SSH gateway as host[:port]
        #[arg(long)]
        ssh_gateway: Option<String>,
    },

    /// Save an SSH private key
    #[command(about = "Save an SSH private key")]
    SetSshKey {
        /// Path to the private key file
        path: PathBuf,
    },

    /// Remove a saved credential
    #[command(about = "Remove a credential from secure storage and the credentials file")]
    Forget {
        /// Credential kind (ssh-key, service-api, access-token)
        kind: CredentialKind,
    },

    /// Report whether native secure storage works
    #[command(about = "Probe native secure storage")]
    Probe,
}

/// Output format for resolve and doctor
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Output as JSON
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    tracing::debug!(home = ?cli.home, account = %cli.account, "Starting credchain-cli");
    let resolver = build_resolver(cli.home.as_deref(), &cli.account)?;

    match cli.command {
        Commands::Resolve { kind, format } => cmd_resolve(&resolver, kind, format),
        Commands::Doctor {
            format,
            check_gateway,
        } => cmd_doctor(&resolver, format, check_gateway),
        Commands::SetToken { token } => cmd_set_token(&resolver, &token),
        Commands::SetApi {
            user,
            password,
            ssh_user,
            ssh_gateway,
        } => cmd_set_api(&resolver, user, password, ssh_user, ssh_gateway),
        Commands::SetSshKey { path } => cmd_set_ssh_key(&resolver, &path),
        Commands::Forget { kind } => cmd_forget(&resolver, kind),
        Commands::Probe => {
            cmd_probe(&resolver);
            Ok(())
        }
    }
}

fn build_resolver(home: Option<&Path>, account: &str) -> Result<FallbackResolver, CliError> {
    let paths = match home {
        Some(home) => CredentialPaths::with_home(home),
        None => CredentialPaths::from_home_dir()
            .ok_or_else(|| CliError::Config("Could not determine home directory".to_string()))?,
    };
    let config = ResolverConfig::new(paths).with_account(account);
    Ok(FallbackResolver::with_platform_defaults(config))
}

/// Resolve command handler
fn cmd_resolve(
    resolver: &FallbackResolver,
    kind: CredentialKind,
    format: OutputFormat,
) -> Result<(), CliError> {
    match resolver.resolve(kind) {
        Ok(resolved) => {
            match format {
                OutputFormat::Text => {
                    println!("{kind}: {}", resolved.value.summary());
                    println!("Source: {}", resolved.description());
                }
                OutputFormat::Json => {
                    let value = json!({
                        "kind": kind,
                        "found": true,
                        "source": resolved.source,
                        "description": resolved.description(),
                        "summary": resolved.value.summary(),
                        "attempts": resolved.attempts,
                    });
                    print_json(&value)?;
                }
            }
            Ok(())
        }
        Err(e) => {
            match format {
                OutputFormat::Text => {
                    println!("{kind} not found. Sources tried:");
                    for source in e.tried() {
                        println!("  - {source}");
                    }
                    if let Some(last) = e.last_error() {
                        println!("Last error: {last}");
                    }
                }
                OutputFormat::Json => {
                    let value = json!({
                        "kind": kind,
                        "found": false,
                        "tried": e.tried(),
                        "last_error": e.last_error(),
                    });
                    print_json(&value)?;
                }
            }
            Err(e.into())
        }
    }
}

/// Doctor command handler
fn cmd_doctor(
    resolver: &FallbackResolver,
    format: OutputFormat,
    check_gateway: bool,
) -> Result<(), CliError> {
    let report = DiagnosticsAggregator::new(resolver)
        .with_options(DiagnosticsOptions { check_gateway })
        .run();

    match format {
        OutputFormat::Text => print!("{}", render_report(&report)),
        OutputFormat::Json => print_json(&report)?,
    }

    if report.overall == credchain_core::DiagnosticStatus::Error {
        return Err(CliError::Unhealthy);
    }
    Ok(())
}

fn render_report(report: &DiagnosticReport) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    for result in &report.results {
        let _ = writeln!(out, "[{}] {}: {}", result.status, result.name, result.message);
        for detail in &result.details {
            let _ = writeln!(out, "      {detail}");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Overall: {}", report.overall);
    let _ = writeln!(out, "Next steps:");
    for (i, step) in report.remediation.iter().enumerate() {
        let _ = writeln!(out, "  {}. {step}", i + 1);
    }
    out
}

fn describe_destination(resolver: &FallbackResolver, source: CredentialSource) -> String {
    match source {
        CredentialSource::NativeStore => resolver.store().display_name().to_string(),
        _ => resolver.files().path().display().to_string(),
    }
}

/// Set-token command handler
fn cmd_set_token(resolver: &FallbackResolver, token: &str) -> Result<(), CliError> {
    if token.trim().is_empty() {
        return Err(CliError::Invalid("Token must not be empty".to_string()));
    }
    let destination = resolver.save_token(&AccessToken::new(token))?;
    println!(
        "Saved access token to {}",
        describe_destination(resolver, destination)
    );
    Ok(())
}

/// Set-api command handler
fn cmd_set_api(
    resolver: &FallbackResolver,
    user: String,
    password: String,
    ssh_user: Option<String>,
    ssh_gateway: Option<String>,
) -> Result<(), CliError> {
    if user.trim().is_empty() || password.is_empty() {
        return Err(CliError::Invalid(
            "API user and password must not be empty".to_string(),
        ));
    }
    let credentials = ServiceApiCredentials::new(user, password, ssh_user, ssh_gateway);
    let destination = resolver.save_service_api(&credentials)?;
    println!(
        "Saved service API credentials for '{}' to {}",
        credentials.api_user(),
        describe_destination(resolver, destination)
    );
    Ok(())
}

/// Set-ssh-key command handler
fn cmd_set_ssh_key(resolver: &FallbackResolver, path: &Path) -> Result<(), CliError> {
    let destination = resolver.save_ssh_key(path)?;
    println!(
        "Saved SSH key {} to {}",
        path.display(),
        describe_destination(resolver, destination)
    );
    Ok(())
}

/// Forget command handler
fn cmd_forget(resolver: &FallbackResolver, kind: CredentialKind) -> Result<(), CliError> {
    let removed = resolver.forget(kind)?;
    if removed.is_empty() {
        println!("No saved {kind} to remove");
    } else {
        for source in removed {
            println!(
                "Removed {kind} from {}",
                describe_destination(resolver, source)
            );
        }
    }
    Ok(())
}

/// Probe command handler
fn cmd_probe(resolver: &FallbackResolver) {
    let store = resolver.store();
    if resolver.native_available() {
        println!("{} is available", store.display_name());
    } else {
        println!("{} is not available", store.display_name());
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Output(format!("Failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, persistence, or unhealthy diagnostics
    pub const GENERAL_ERROR: i32 = 1;
    /// Credential not found in any source
    pub const NOT_FOUND: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Invalid(String),

    /// Resolution or persistence error
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Diagnostics reported at least one error
    #[error("Credential diagnostics reported errors")]
    Unhealthy,

    /// Output error
    #[error("Output error: {0}")]
    Output(String),
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, persistence, unhealthy diagnostics)
    /// - 2: Credential not found
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Resolve(ResolveError::NotFound { .. }) => exit_codes::NOT_FOUND,
            Self::Config(_)
            | Self::Invalid(_)
            | Self::Resolve(ResolveError::Persist { .. })
            | Self::Unhealthy
            | Self::Output(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
