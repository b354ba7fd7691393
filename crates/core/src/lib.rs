//! blurmill foundation crate.
//!
//! Shared vocabulary for the chain runtime, the built-in workers, and the
//! application layer:
//!
//! - [`ImageRef`] — opaque locator for an image resource.
//! - [`InputData`] — immutable key-value bag attached to work requests.
//! - [`WorkRequest`] / [`WorkerKind`] — one unit of background work.
//! - [`WorkStatus`] — observed unit status plus the transition state machine.
//! - [`constants`] — well-known names, tags, and data keys.
//!
//! This crate has zero internal dependencies so every other workspace
//! member can build on it.

pub mod constants;
pub mod data;
pub mod error;
pub mod request;
pub mod status;
pub mod types;
pub mod validation;

pub use data::InputData;
pub use error::CoreError;
pub use request::{RequestId, WorkRequest, WorkerKind};
pub use status::WorkStatus;
pub use types::ImageRef;
