//! Error types for executor invocations.

use thiserror::Error;

/// A single executor invocation failed.
///
/// Recoverable from the router's perspective: it reports the failure to the
/// provider's circuit breaker and moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The executor does not know this provider
    #[error("provider '{0}' is not known to this executor")]
    UnknownProvider(String),

    /// The executor gave up after its own deadline
    #[error("execution timed out after {0}ms")]
    Timeout(u64),

    /// The executor ran and failed
    #[error("execution failed: {0}")]
    Failed(String),
}
