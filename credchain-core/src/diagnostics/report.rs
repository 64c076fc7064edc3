//! Diagnostic result types and the severity fold

use serde::Serialize;
use std::fmt;

/// Message used when no check asks for a fix
pub const ALL_GOOD: &str = "All credentials are configured correctly.";

/// Severity of a single check, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStatus {
    /// Nothing to do
    Ok,
    /// Works, but something should be looked at
    Warning,
    /// A required credential is unusable
    Error,
}

impl fmt::Display for DiagnosticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticResult {
    /// Check name, e.g. `SSH key`
    pub name: String,
    /// Severity
    pub status: DiagnosticStatus,
    /// One-line summary
    pub message: String,
    /// Supporting lines; never contain secret values
    pub details: Vec<String>,
    /// Suggested fix, if the check found something actionable
    #[serde(skip)]
    pub(crate) fix: Option<Fix>,
}

impl DiagnosticResult {
    /// Creates a result with no details
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        status: DiagnosticStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            details: Vec::new(),
            fix: None,
        }
    }

    /// Adds a detail line
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// Adds several detail lines
    #[must_use]
    pub fn with_details(mut self, details: impl IntoIterator<Item = String>) -> Self {
        self.details.extend(details);
        self
    }

    pub(crate) fn with_fix(mut self, priority: FixPriority, text: impl Into<String>) -> Self {
        self.fix = Some(Fix {
            priority,
            text: text.into(),
        });
        self
    }
}

/// Remediation ranking; lower sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum FixPriority {
    ServiceApi,
    SshKey,
    CredentialsFile,
    AccessToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fix {
    priority: FixPriority,
    text: String,
}

/// Full output of one diagnostics run
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Per-check results, in battery order
    pub results: Vec<DiagnosticResult>,
    /// Worst status across all results
    pub overall: DiagnosticStatus,
    /// Suggested fixes, most important first
    pub remediation: Vec<String>,
}

impl DiagnosticReport {
    /// Builds a report, computing the overall status and remediation
    #[must_use]
    pub fn from_results(results: Vec<DiagnosticResult>) -> Self {
        let overall = overall_status(&results);
        let remediation = remediation(&results);
        Self {
            results,
            overall,
            remediation,
        }
    }

    /// Looks up a result by check name
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&DiagnosticResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Worst status in `results`; `Ok` when empty
#[must_use]
pub fn overall_status(results: &[DiagnosticResult]) -> DiagnosticStatus {
    results
        .iter()
        .map(|r| r.status)
        .max()
        .unwrap_or(DiagnosticStatus::Ok)
}

/// Suggested fixes ordered by priority, then by battery order
///
/// Returns [`ALL_GOOD`] alone when nothing needs fixing.
#[must_use]
pub fn remediation(results: &[DiagnosticResult]) -> Vec<String> {
    let mut fixes: Vec<&Fix> = results.iter().filter_map(|r| r.fix.as_ref()).collect();
    if fixes.is_empty() {
        return vec![ALL_GOOD.to_string()];
    }
    fixes.sort_by_key(|fix| fix.priority);

    let mut out: Vec<String> = Vec::with_capacity(fixes.len());
    for fix in fixes {
        if !out.contains(&fix.text) {
            out.push(fix.text.clone());
        }
    }
    out
}
