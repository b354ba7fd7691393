use blurmill_core::error::CoreError;
use blurmill_core::request::WorkerKind;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Invalid chain: {0}")]
    InvalidChain(#[from] CoreError),

    #[error("Chain must contain at least one work request")]
    EmptyChain,

    #[error("No worker registered for kind: {0}")]
    UnknownWorker(WorkerKind),
}
