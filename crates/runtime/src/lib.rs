//! blurmill chain runtime.
//!
//! Executes ordered chains of work units under unique names:
//!
//! - [`Worker`] — the unit-of-work contract implemented by the built-in
//!   workers.
//! - [`ChainRuntime`] — unique-name registry, sequential chain executor,
//!   and cancellation surface.
//! - [`WorkInfo`] — observable per-unit snapshot, served through
//!   tag-scoped `watch` channels.
//!
//! A chain runs as a single tokio task. Units execute strictly in order;
//! each unit's output bag is merged over the next unit's declared input.
//! A failed unit aborts the rest of the chain, and cancellation is
//! cooperative at unit boundaries.

pub mod error;
pub mod manager;
pub mod tracker;
pub mod worker;

pub use error::RuntimeError;
pub use manager::{ChainHandle, ChainRuntime, ChainRuntimeBuilder, ExistingChainPolicy};
pub use tracker::WorkInfo;
pub use worker::{WorkContext, Worker, WorkerError};
