//! Credential health diagnostics
//!
//! `DiagnosticsAggregator` runs a fixed battery of checks against a
//! resolver's current view of the world, folds the results into an overall
//! status and derives prioritised remediation steps. Nothing is cached
//! between runs.

mod checks;
mod report;

use tracing::info;

use crate::resolver::FallbackResolver;

pub use checks::{
    ACCESS_TOKEN, CREDENTIALS_FILE, DEFAULT_KEYS, DEFAULT_SSH_PORT, ENVIRONMENT, GATEWAY,
    GATEWAY_TIMEOUT, SECURE_STORAGE, SERVICE_API, SSH_KEY,
};
pub use report::{
    overall_status, remediation, DiagnosticReport, DiagnosticResult, DiagnosticStatus, ALL_GOOD,
};

/// Optional checks to include in a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsOptions {
    /// Try a TCP connection to the SSH gateway
    pub check_gateway: bool,
}

/// Runs the credential health battery
#[derive(Debug)]
pub struct DiagnosticsAggregator<'a> {
    resolver: &'a FallbackResolver,
    options: DiagnosticsOptions,
}

impl<'a> DiagnosticsAggregator<'a> {
    /// Creates an aggregator with default options
    #[must_use]
    pub fn new(resolver: &'a FallbackResolver) -> Self {
        Self {
            resolver,
            options: DiagnosticsOptions::default(),
        }
    }

    /// Sets the options for subsequent runs
    #[must_use]
    pub const fn with_options(mut self, options: DiagnosticsOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs every check in order and builds the report
    ///
    /// Secure storage is probed afresh at the start of every run.
    #[must_use]
    pub fn run(&self) -> DiagnosticReport {
        let resolver = self.resolver;
        resolver.recheck_native_storage();
        let mut results = vec![
            checks::secure_storage(resolver),
            checks::service_api(resolver),
            checks::ssh_key(resolver),
            checks::access_token(resolver),
            checks::credentials_file(resolver),
            checks::environment(resolver),
            checks::default_keys(resolver),
        ];
        if self.options.check_gateway {
            results.push(checks::gateway(resolver));
        }

        let report = DiagnosticReport::from_results(results);
        info!(
            overall = %report.overall,
            checks = report.results.len(),
            "Credential diagnostics complete"
        );
        report
    }
}
