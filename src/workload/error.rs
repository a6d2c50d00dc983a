//! Validation errors for incoming requests.

use thiserror::Error;

/// A request failed validation before any provider was contacted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    /// The prompt was empty or whitespace-only
    #[error("prompt cannot be empty")]
    EmptyPrompt,

    /// `max_output_tokens` was negative
    #[error("max_output_tokens must be a non-negative integer, got {value}")]
    NegativeMaxTokens { value: i64 },
}
