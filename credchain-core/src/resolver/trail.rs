//! Attempt bookkeeping for a single resolve call

use tracing::{debug, info};

use crate::error::ResolveError;
use crate::models::{AttemptOutcome, CredentialKind, CredentialSource, ResolutionAttempt, Resolved};

/// Ordered record of every source consulted during one resolve call
#[derive(Debug)]
pub(super) struct Trail {
    kind: CredentialKind,
    attempts: Vec<ResolutionAttempt>,
    last_error: Option<String>,
}

impl Trail {
    pub(super) const fn new(kind: CredentialKind) -> Self {
        Self {
            kind,
            attempts: Vec::new(),
            last_error: None,
        }
    }

    /// Records one attempt; a recorded error replaces any earlier one
    pub(super) fn record(
        &mut self,
        source: CredentialSource,
        description: impl Into<String>,
        outcome: AttemptOutcome,
        error: Option<String>,
    ) {
        let description = description.into();
        debug!(
            kind = %self.kind,
            source = %description,
            outcome = %outcome,
            error = error.as_deref().unwrap_or(""),
            "Credential source consulted"
        );
        if let Some(message) = &error {
            self.last_error = Some(message.clone());
        }
        self.attempts.push(ResolutionAttempt {
            source,
            description,
            outcome,
            error,
        });
    }

    /// Records the winning attempt and wraps the value
    pub(super) fn found<T>(
        mut self,
        source: CredentialSource,
        description: impl Into<String>,
        value: T,
    ) -> Resolved<T> {
        let description = description.into();
        info!(kind = %self.kind, source = %description, "Credential resolved");
        self.record(source, description, AttemptOutcome::Found, None);
        Resolved {
            value,
            source,
            attempts: self.attempts,
        }
    }

    /// Converts the trail into the caller-visible exhaustion error
    pub(super) fn exhausted(self) -> ResolveError {
        ResolveError::NotFound {
            kind: self.kind,
            tried: self
                .attempts
                .into_iter()
                .map(|attempt| attempt.description)
                .collect(),
            last_error: self.last_error,
        }
    }
}
