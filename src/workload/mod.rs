//! Workload classification for incoming execution requests.
//!
//! This module turns a raw request into a [`WorkloadProfile`] (size class,
//! complexity, required capabilities, priority) that routing uses to pick a
//! provider. Classification is pure and synchronous: no network, no disk,
//! safe to call many times per second.

mod error;
mod heuristics;
mod profile;

pub use error::InvalidRequest;
pub use heuristics::KeywordHeuristics;
pub use profile::{Complexity, ExecutionRequest, RequestPriority, SizeClass, WorkloadProfile};

/// Estimate prompt tokens with the chars/4 heuristic.
///
/// Deliberately crude: 1 token ~ 4 characters, rounded up. Good enough for
/// size bucketing and quota estimates, not for billing-grade counts.
pub fn estimate_prompt_tokens(prompt: &str) -> u64 {
    (prompt.len() as u64).div_ceil(4)
}

/// Pure classifier mapping an [`ExecutionRequest`] into a [`WorkloadProfile`].
#[derive(Debug, Clone, Default)]
pub struct WorkloadAnalyzer {
    heuristics: KeywordHeuristics,
}

impl WorkloadAnalyzer {
    /// Create an analyzer with the default keyword tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with custom keyword tables.
    pub fn with_heuristics(heuristics: KeywordHeuristics) -> Self {
        Self { heuristics }
    }

    /// Validate and classify a request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`] if the prompt is empty/whitespace-only or
    /// `max_output_tokens` is negative. No provider is contacted either way.
    pub fn analyze(&self, request: &ExecutionRequest) -> Result<WorkloadProfile, InvalidRequest> {
        if request.prompt.trim().is_empty() {
            return Err(InvalidRequest::EmptyPrompt);
        }

        let max_output_tokens = match request.max_output_tokens {
            Some(value) if value < 0 => {
                return Err(InvalidRequest::NegativeMaxTokens { value });
            }
            Some(value) => value as u64,
            None => 0,
        };

        let estimated_tokens = estimate_prompt_tokens(&request.prompt) + max_output_tokens;
        let lowered = request.prompt.to_lowercase();
        let h = &self.heuristics;

        let complexity = if request.prompt.len() >= h.complex_prompt_chars
            || KeywordHeuristics::matches(&lowered, &h.complexity_keywords)
        {
            Complexity::Complex
        } else if request.prompt.len() <= h.simple_prompt_chars {
            Complexity::Simple
        } else {
            Complexity::Moderate
        };

        let priority = if KeywordHeuristics::matches(&lowered, &h.high_priority_keywords) {
            RequestPriority::High
        } else if KeywordHeuristics::matches(&lowered, &h.low_priority_keywords) {
            RequestPriority::Low
        } else {
            RequestPriority::Normal
        };

        Ok(WorkloadProfile {
            estimated_tokens,
            size_class: SizeClass::from_tokens(estimated_tokens),
            complexity,
            needs_streaming: KeywordHeuristics::matches(&lowered, &h.streaming_keywords),
            needs_vision: KeywordHeuristics::matches(&lowered, &h.vision_keywords),
            needs_function_calling: KeywordHeuristics::matches(
                &lowered,
                &h.function_calling_keywords,
            ),
            priority,
        })
    }
}
