//! Request routing across providers.
//!
//! The router is the orchestrator of the dispatch pipeline: it classifies
//! the request, filters providers by circuit state, quota, and budget,
//! orders the survivors deterministically, then tries them one at a time
//! until one succeeds or the list runs out. At most one provider is ever
//! charged per request.

mod error;
mod outcome;

pub use error::{CandidateFailure, CandidateOutcome, RouteError};
pub use outcome::RouteResponse;

use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::breaker::Transition;
use crate::cost::CostLedger;
use crate::events::{AttemptOutcome, DispatchEvent, EventBus};
use crate::executor::TaskExecutor;
use crate::quota::QuotaTracker;
use crate::registry::{Provider, ProviderRegistry};
use crate::workload::{estimate_prompt_tokens, ExecutionRequest, WorkloadAnalyzer, WorkloadProfile};

/// Selects and drives providers for execution requests.
///
/// # Concurrency
///
/// `route` is called concurrently by independent requests; all shared
/// provider state lives in the registry and is updated through its
/// serialized methods. Within one call, candidates are tried strictly in
/// order, one at a time.
///
/// # Cancellation
///
/// Dropping the `route` future aborts the in-flight executor invocation
/// (the executor port is required to be cancellation-safe) and prevents any
/// further candidate from being tried. Usage and cost already recorded for
/// completed attempts in the same call remain recorded; there is no
/// compensating rollback.
pub struct Router {
    registry: Arc<ProviderRegistry>,
    executor: Arc<dyn TaskExecutor>,
    quota: Arc<QuotaTracker>,
    costs: Arc<CostLedger>,
    analyzer: WorkloadAnalyzer,
    events: EventBus,
}

impl Router {
    /// Create a router with a default analyzer and a private event bus.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        executor: Arc<dyn TaskExecutor>,
        quota: Arc<QuotaTracker>,
        costs: Arc<CostLedger>,
    ) -> Self {
        Self {
            registry,
            executor,
            quota,
            costs,
            analyzer: WorkloadAnalyzer::new(),
            events: EventBus::default(),
        }
    }

    /// Swap in a tuned workload analyzer.
    pub fn with_analyzer(mut self, analyzer: WorkloadAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Use a shared event bus instead of a private one.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Route a request to the best eligible provider.
    ///
    /// Tries candidates in ascending priority order (ties broken by observed
    /// latency, then declaration order) and returns the first success. A
    /// single call never retries the same provider twice; retry-with-backoff
    /// belongs to the caller.
    ///
    /// # Errors
    ///
    /// - [`RouteError::Invalid`] if the request fails validation (no
    ///   provider is contacted)
    /// - [`RouteError::ExplicitProviderUnavailable`] if a demanded provider
    ///   is ineligible (no silent fallback)
    /// - [`RouteError::Exhausted`] when every candidate was skipped or
    ///   failed, with the full per-candidate trail
    pub async fn route(&self, request: ExecutionRequest) -> Result<RouteResponse, RouteError> {
        let request_id = Uuid::new_v4();
        let profile = self.analyzer.analyze(&request)?;

        tracing::debug!(
            request_id = %request_id,
            estimated_tokens = profile.estimated_tokens,
            size_class = ?profile.size_class,
            complexity = ?profile.complexity,
            priority = ?profile.priority,
            "Request classified"
        );
        self.events.emit(DispatchEvent::RequestClassified {
            request_id,
            profile: profile.clone(),
        });

        let mut trail: Vec<CandidateOutcome> = Vec::new();
        let candidates = self.eligible_candidates(&request, &mut trail).await?;

        self.events.emit(DispatchEvent::CandidatesComputed {
            request_id,
            candidates: candidates.iter().map(|p| p.name.clone()).collect(),
        });

        for provider in candidates {
            // Take the breaker permit at attempt time so the single
            // half-open trial slot is only spent on a real attempt.
            match self.registry.try_acquire(&provider.name, Utc::now()) {
                Ok((admitted, transition)) => {
                    self.emit_transition(&provider.name, transition);
                    if !admitted {
                        crate::metrics::record_rejection(&provider.name, "circuit_open");
                        trail.push(CandidateOutcome {
                            provider: provider.name.clone(),
                            failure: CandidateFailure::CircuitOpen,
                        });
                        continue;
                    }
                }
                Err(_) => {
                    trail.push(CandidateOutcome {
                        provider: provider.name.clone(),
                        failure: CandidateFailure::NotRegistered,
                    });
                    continue;
                }
            }

            let started = Instant::now();
            let attempt = tokio::time::timeout(
                provider.timeout,
                self.executor
                    .invoke(&provider.name, &request.prompt, provider.timeout),
            )
            .await;
            let duration = started.elapsed();

            match attempt {
                Ok(Ok(output)) => {
                    let transition = self
                        .registry
                        .record_success(&provider.name, duration.as_millis() as u32)
                        .ok()
                        .flatten();
                    self.emit_transition(&provider.name, transition);

                    self.record_usage(&provider, &request, &profile).await;

                    tracing::info!(
                        request_id = %request_id,
                        provider = %provider.name,
                        duration_ms = duration.as_millis() as u64,
                        attempts_failed = trail.len(),
                        "Request routed"
                    );
                    self.events.emit(DispatchEvent::AttemptCompleted {
                        request_id,
                        provider: provider.name.clone(),
                        duration_ms: duration.as_millis() as u64,
                        outcome: AttemptOutcome::Success,
                    });
                    crate::metrics::record_attempt(
                        &provider.name,
                        "success",
                        duration.as_secs_f64(),
                    );
                    crate::metrics::record_route("success");

                    return Ok(RouteResponse {
                        request_id,
                        provider: provider.name.clone(),
                        output,
                        duration,
                        profile,
                        trail,
                    });
                }
                Ok(Err(err)) => {
                    let transition = self
                        .registry
                        .record_failure(&provider.name, Utc::now())
                        .ok()
                        .flatten();
                    self.emit_transition(&provider.name, transition);

                    tracing::warn!(
                        request_id = %request_id,
                        provider = %provider.name,
                        error = %err,
                        "Provider attempt failed, trying next candidate"
                    );
                    self.events.emit(DispatchEvent::AttemptCompleted {
                        request_id,
                        provider: provider.name.clone(),
                        duration_ms: duration.as_millis() as u64,
                        outcome: AttemptOutcome::Failure,
                    });
                    crate::metrics::record_attempt(
                        &provider.name,
                        "failure",
                        duration.as_secs_f64(),
                    );
                    trail.push(CandidateOutcome {
                        provider: provider.name.clone(),
                        failure: CandidateFailure::Executor {
                            message: err.to_string(),
                        },
                    });
                }
                Err(_elapsed) => {
                    let transition = self
                        .registry
                        .record_failure(&provider.name, Utc::now())
                        .ok()
                        .flatten();
                    self.emit_transition(&provider.name, transition);

                    let after_ms = provider.timeout.as_millis() as u64;
                    tracing::warn!(
                        request_id = %request_id,
                        provider = %provider.name,
                        timeout_ms = after_ms,
                        "Provider attempt timed out, trying next candidate"
                    );
                    self.events.emit(DispatchEvent::AttemptCompleted {
                        request_id,
                        provider: provider.name.clone(),
                        duration_ms: duration.as_millis() as u64,
                        outcome: AttemptOutcome::Timeout,
                    });
                    crate::metrics::record_attempt(
                        &provider.name,
                        "timeout",
                        duration.as_secs_f64(),
                    );
                    trail.push(CandidateOutcome {
                        provider: provider.name.clone(),
                        failure: CandidateFailure::Timeout { after_ms },
                    });
                }
            }
        }

        crate::metrics::record_route("exhausted");
        tracing::warn!(
            request_id = %request_id,
            candidates = trail.len(),
            "Routing exhausted"
        );
        Err(RouteError::Exhausted { trail })
    }

    /// Build the ordered candidate list, pushing every exclusion into the
    /// trail. An explicit provider override short-circuits: eligible means
    /// it becomes the sole candidate, ineligible fails fast.
    async fn eligible_candidates(
        &self,
        request: &ExecutionRequest,
        trail: &mut Vec<CandidateOutcome>,
    ) -> Result<Vec<Arc<Provider>>, RouteError> {
        if let Some(name) = &request.provider_override {
            let Some(provider) = self.registry.get(name) else {
                return Err(RouteError::ExplicitProviderUnavailable {
                    provider: name.clone(),
                    reason: CandidateFailure::NotRegistered,
                });
            };
            if let Some(reason) = self.ineligibility(&provider).await {
                return Err(RouteError::ExplicitProviderUnavailable {
                    provider: name.clone(),
                    reason,
                });
            }
            return Ok(vec![provider]);
        }

        let mut eligible = Vec::new();
        for provider in self.registry.all() {
            match self.ineligibility(&provider).await {
                Some(reason) => trail.push(CandidateOutcome {
                    provider: provider.name.clone(),
                    failure: reason,
                }),
                None => eligible.push(provider),
            }
        }

        // Deterministic order: priority, then observed latency, then
        // declaration order. Never random.
        eligible.sort_by_key(|p| {
            (
                p.priority,
                p.avg_latency_ms.load(Ordering::SeqCst),
                p.order,
            )
        });
        Ok(eligible)
    }

    /// Why this provider cannot be a candidate right now, if any reason.
    ///
    /// Reads are tolerant of staleness: a provider may still fail between
    /// this check and the attempt, which the attempt loop absorbs by moving
    /// to the next candidate.
    async fn ineligibility(&self, provider: &Provider) -> Option<CandidateFailure> {
        if !provider.enabled {
            return Some(CandidateFailure::Disabled);
        }

        if !provider
            .breaker
            .lock()
            .unwrap()
            .allows_request(Utc::now())
        {
            crate::metrics::record_rejection(&provider.name, "circuit_open");
            return Some(CandidateFailure::CircuitOpen);
        }

        if !self.quota.has_quota(&provider.name).await.available {
            crate::metrics::record_rejection(&provider.name, "quota");
            self.events.emit(DispatchEvent::QuotaRejected {
                provider: provider.name.clone(),
            });
            return Some(CandidateFailure::QuotaExhausted);
        }

        if !self.costs.within_budget(&provider.name).await {
            crate::metrics::record_rejection(&provider.name, "budget");
            self.events.emit(DispatchEvent::BudgetRejected {
                provider: provider.name.clone(),
            });
            return Some(CandidateFailure::OverBudget);
        }

        None
    }

    /// Record quota usage and, when pricing is configured, cost for a
    /// successful attempt. Recording failures are logged, never turned into
    /// a routing failure: the caller already has a response.
    async fn record_usage(
        &self,
        provider: &Provider,
        request: &ExecutionRequest,
        profile: &WorkloadProfile,
    ) {
        if let Err(err) = self
            .quota
            .record(&provider.name, 1, profile.estimated_tokens as i64)
            .await
        {
            tracing::warn!(
                provider = %provider.name,
                error = %err,
                "Failed to record quota usage for completed attempt"
            );
        }

        if let Some(pricing) = provider.pricing {
            let prompt_tokens = estimate_prompt_tokens(&request.prompt);
            let output_tokens = request
                .max_output_tokens
                .map(|v| v as u64)
                .unwrap_or(prompt_tokens / 2);
            let amount = pricing.cost_usd(prompt_tokens, output_tokens);
            if let Err(err) = self.costs.record(&provider.name, amount).await {
                tracing::warn!(
                    provider = %provider.name,
                    error = %err,
                    "Failed to record cost for completed attempt"
                );
            }
        }
    }

    fn emit_transition(&self, provider: &str, transition: Option<Transition>) {
        if let Some((from, to)) = transition {
            tracing::info!(
                provider = provider,
                from = %from,
                to = %to,
                "Circuit state changed"
            );
            crate::metrics::record_circuit_transition(provider, &to.to_string());
            self.events.emit(DispatchEvent::CircuitTransition {
                provider: provider.to_string(),
                from,
                to,
            });
        }
    }
}
