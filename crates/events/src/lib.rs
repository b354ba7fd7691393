//! blurmill status event infrastructure.
//!
//! This crate provides the building blocks for observing the pipeline:
//!
//! - [`StatusBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StatusEvent`] — the canonical per-transition event envelope.

pub mod bus;

pub use bus::{StatusBus, StatusEvent};
