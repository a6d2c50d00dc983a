//! Executor port: the boundary to the actual task executors.
//!
//! The dispatch core treats executors as opaque, potentially slow,
//! potentially failing black boxes. Whether an implementation shells out to
//! a subprocess, calls an HTTP API, or runs in-process is invisible here.

mod error;

pub use error::ExecutorError;

use async_trait::async_trait;
use std::time::Duration;

/// Unified interface to the external task executors.
///
/// One implementation serves all providers, dispatching on the provider
/// name; the core never constructs executors itself.
///
/// # Cancellation Safety
///
/// All methods must be cancellation-safe: dropping a returned future must
/// abort the underlying work (kill the subprocess, drop the connection) and
/// release its resources, not merely abandon it. The router relies on this
/// both for per-attempt timeouts and for caller-initiated cancellation.
#[async_trait]
pub trait TaskExecutor: Send + Sync + 'static {
    /// Execute a prompt on the named provider.
    ///
    /// `timeout` is the provider's configured attempt budget. The router
    /// also enforces it externally; implementations should pass it to the
    /// underlying executor so work is terminated, not orphaned, on expiry.
    ///
    /// # Errors
    ///
    /// - [`ExecutorError::UnknownProvider`] if the name is not recognized
    /// - [`ExecutorError::Timeout`] if the executor gave up on its own
    /// - [`ExecutorError::Failed`] for any other execution failure
    async fn invoke(
        &self,
        provider: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ExecutorError>;

    /// Lightweight availability check for the named provider.
    ///
    /// Used by the health monitor; must be cheap and must not perform real
    /// work. A probe failure only affects future routing decisions.
    async fn probe(&self, provider: &str) -> Result<(), ExecutorError>;
}
