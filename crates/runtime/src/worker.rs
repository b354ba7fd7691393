//! The unit-of-work contract.

use blurmill_core::data::InputData;
use tokio_util::sync::CancellationToken;

/// Error returned by a worker.
///
/// Converted to a `Failed` status at the unit boundary; no structured
/// payload beyond the logged message survives past that point, and the
/// chain does not continue past a failed unit.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Missing required input key: {0}")]
    MissingInput(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing failed: {0}")]
    Image(String),

    #[error("Worker failed: {0}")]
    Failed(String),
}

/// Execution context handed to a worker.
///
/// Carries the merged input bag and the chain's cancellation token.
/// Workers doing long operations should check
/// [`is_cancelled`](WorkContext::is_cancelled) between steps; the runtime
/// additionally abandons a unit at the next await point once the token
/// fires, so cancellation is coarse by design.
#[derive(Debug, Clone)]
pub struct WorkContext {
    input: InputData,
    cancel: CancellationToken,
}

impl WorkContext {
    pub fn new(input: InputData, cancel: CancellationToken) -> Self {
        Self { input, cancel }
    }

    /// The merged input bag for this unit.
    pub fn input(&self) -> &InputData {
        &self.input
    }

    /// True once the chain has been cancelled or evicted.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The chain's cancellation token, for `tokio::select!`-style waits.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// One stage of background work with a defined input/output contract.
///
/// Implementations are registered with the runtime per worker kind and
/// shared across chains, so they must be `Send + Sync`. The returned bag
/// becomes part of the input for the next unit in the chain.
#[async_trait::async_trait]
pub trait Worker: Send + Sync {
    async fn execute(&self, ctx: WorkContext) -> Result<InputData, WorkerError>;
}
