//! Request and profile types for workload classification.

use serde::{Deserialize, Serialize};

/// An execution request entering the dispatch pipeline.
///
/// Capability requirements (streaming, vision, function calling) are inferred
/// by the analyzer from the prompt, never supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionRequest {
    /// The prompt to execute. Must be non-empty and non-whitespace.
    pub prompt: String,
    /// Optional cap on output tokens. Signed so that out-of-range caller
    /// input is rejected with a validation error instead of silently clamped.
    pub max_output_tokens: Option<i64>,
    /// Optional explicit provider override. When set and the provider is
    /// ineligible, routing fails fast instead of falling back.
    pub provider_override: Option<String>,
}

impl ExecutionRequest {
    /// Create a request for the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_output_tokens: None,
            provider_override: None,
        }
    }

    /// Set the output token cap.
    pub fn with_max_output_tokens(mut self, max_output_tokens: i64) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Demand a specific provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider_override = Some(provider.into());
        self
    }
}

impl Default for ExecutionRequest {
    fn default() -> Self {
        Self::new("")
    }
}

/// Size class buckets over estimated token volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    /// Under 500 estimated tokens
    Tiny,
    /// Under 2,000 estimated tokens
    Small,
    /// Under 8,000 estimated tokens
    Medium,
    /// Under 32,000 estimated tokens
    Large,
    /// 32,000 estimated tokens or more
    Huge,
}

impl SizeClass {
    /// Bucket an estimated token count.
    pub fn from_tokens(tokens: u64) -> Self {
        match tokens {
            0..=499 => SizeClass::Tiny,
            500..=1999 => SizeClass::Small,
            2000..=7999 => SizeClass::Medium,
            8000..=31999 => SizeClass::Large,
            _ => SizeClass::Huge,
        }
    }
}

/// Heuristic complexity classification of a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Routing priority derived from the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    Low,
    Normal,
    High,
}

/// Derived classification of a request, computed once per request and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadProfile {
    /// Estimated total token volume (prompt estimate plus output cap).
    ///
    /// Derived with the chars/4 heuristic; an approximation, not a count.
    pub estimated_tokens: u64,
    /// Size bucket over `estimated_tokens`
    pub size_class: SizeClass,
    /// Keyword/length complexity heuristic
    pub complexity: Complexity,
    /// Whether the prompt signals a streaming response
    pub needs_streaming: bool,
    /// Whether the prompt signals image/diagram work
    pub needs_vision: bool,
    /// Whether the prompt signals tool/function invocation
    pub needs_function_calling: bool,
    /// Urgency derived from the prompt
    pub priority: RequestPriority,
}
