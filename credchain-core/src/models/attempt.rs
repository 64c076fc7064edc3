//! Per-source resolution attempts.

use serde::Serialize;
use std::fmt;

use super::kind::CredentialSource;

/// What happened when one source was consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The source produced the credential
    Found,
    /// The source had nothing for this kind
    Missing,
    /// The source had a value that failed validation
    Invalid,
    /// The source is not usable on this platform or build
    Unavailable,
    /// The source failed while being read
    Failed,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Found => "found",
            Self::Missing => "missing",
            Self::Invalid => "invalid",
            Self::Unavailable => "unavailable",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One consulted source, built fresh for every resolve call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionAttempt {
    /// Which kind of source this was
    pub source: CredentialSource,
    /// Human-readable description, e.g. `Environment variable GITHUB_TOKEN`
    pub description: String,
    /// Result of consulting the source
    pub outcome: AttemptOutcome,
    /// Underlying error message, if any
    pub error: Option<String>,
}

/// A successfully resolved credential with its provenance
#[derive(Debug)]
pub struct Resolved<T> {
    /// The credential value
    pub value: T,
    /// The source that produced it
    pub source: CredentialSource,
    /// Every source consulted, ending with the winning one
    pub attempts: Vec<ResolutionAttempt>,
}

impl<T> Resolved<T> {
    /// Description of the winning source
    #[must_use]
    pub fn description(&self) -> &str {
        self.attempts
            .last()
            .map_or("unknown source", |a| a.description.as_str())
    }

    /// Maps the value, keeping provenance
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            source: self.source,
            attempts: self.attempts,
        }
    }
}
