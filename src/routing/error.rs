//! Error types for routing failures.

use serde::Serialize;
use thiserror::Error;

use crate::workload::InvalidRequest;

/// Why a candidate was skipped, or why its attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateFailure {
    /// The provider is disabled in configuration
    #[error("provider is disabled")]
    Disabled,

    /// No provider with this name is registered
    #[error("provider is not registered")]
    NotRegistered,

    /// The circuit breaker refused the request
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// Today's free allowance is spent
    #[error("daily free quota exhausted")]
    QuotaExhausted,

    /// The cost budget for the current window is spent
    #[error("cost budget exceeded")]
    OverBudget,

    /// The attempt exceeded the provider's configured timeout
    #[error("attempt timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// The executor ran and failed
    #[error("executor failed: {message}")]
    Executor { message: String },
}

/// One entry in a route call's failure trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateOutcome {
    pub provider: String,
    pub failure: CandidateFailure,
}

/// Errors surfaced by [`super::Router::route`].
#[derive(Debug, Error)]
pub enum RouteError {
    /// The request failed validation; no provider was contacted
    #[error(transparent)]
    Invalid(#[from] InvalidRequest),

    /// The caller demanded a specific provider that is ineligible
    #[error("explicit provider '{provider}' is unavailable: {reason}")]
    ExplicitProviderUnavailable {
        provider: String,
        reason: CandidateFailure,
    },

    /// Every eligible candidate failed, or none were eligible.
    ///
    /// The trail lists each candidate with the reason it was skipped or the
    /// way its attempt failed, in the order they were considered.
    #[error("no provider could satisfy the request ({} candidates in trail)", trail.len())]
    Exhausted { trail: Vec<CandidateOutcome> },
}
