//! Structured dispatch events.
//!
//! The core emits fire-and-forget events for telemetry consumers over a
//! broadcast channel. Emission never blocks and never fails the emitting
//! operation; with no subscribers the event is simply dropped.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::breaker::CircuitState;
use crate::workload::WorkloadProfile;

/// Outcome of a single provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Failure,
    Timeout,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::Failure => write!(f, "failure"),
            AttemptOutcome::Timeout => write!(f, "timeout"),
        }
    }
}

/// Events emitted by the dispatch pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// A request passed validation and was classified
    RequestClassified {
        request_id: Uuid,
        profile: WorkloadProfile,
    },
    /// The eligible candidate list was computed, in attempt order
    CandidatesComputed {
        request_id: Uuid,
        candidates: Vec<String>,
    },
    /// One provider attempt finished
    AttemptCompleted {
        request_id: Uuid,
        provider: String,
        duration_ms: u64,
        outcome: AttemptOutcome,
    },
    /// A provider's circuit breaker changed state
    CircuitTransition {
        provider: String,
        from: CircuitState,
        to: CircuitState,
    },
    /// A provider was excluded for exhausted quota
    QuotaRejected { provider: String },
    /// A provider was excluded for an exceeded cost budget
    BudgetRejected { provider: String },
}

/// Fire-and-forget event fan-out.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event. Never blocks; a send with no receivers is not an error.
    pub fn emit(&self, event: DispatchEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(DispatchEvent::QuotaRejected {
            provider: "claude".to_string(),
        });

        match rx.recv().await.unwrap() {
            DispatchEvent::QuotaRejected { provider } => assert_eq!(provider, "claude"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::default();
        bus.emit(DispatchEvent::BudgetRejected {
            provider: "gemini".to_string(),
        });
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = DispatchEvent::CircuitTransition {
            provider: "claude".to_string(),
            from: CircuitState::Closed,
            to: CircuitState::Open,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "circuit_transition");
        assert_eq!(json["from"], "closed");
        assert_eq!(json["to"], "open");
    }
}
