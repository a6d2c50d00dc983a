//! Successful routing outcome.

use std::time::Duration;
use uuid::Uuid;

use super::error::CandidateOutcome;
use crate::workload::WorkloadProfile;

/// The result of one successful route call.
///
/// Ephemeral: returned to the caller and dropped; dynamic provider state has
/// already been updated by the time this exists.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    /// Correlation id shared with the emitted events
    pub request_id: Uuid,
    /// The provider that produced the output
    pub provider: String,
    /// Executor output text
    pub output: String,
    /// Wall-clock duration of the winning attempt
    pub duration: Duration,
    /// The profile the request was classified into
    pub profile: WorkloadProfile,
    /// Candidates skipped or failed before the winning attempt, in order
    pub trail: Vec<CandidateOutcome>,
}
