//! blurmill application layer.
//!
//! The pieces a front end wires together:
//!
//! - [`build_blur_chain`] — composes the cleanup -> blur xN -> save chain.
//! - [`BlurContext`] — request-scoped context holding the source image
//!   and driving the pipeline under its fixed unique name.
//! - [`UiState`] / [`spawn_ui_observer`] — maps tagged save-unit
//!   snapshots to a coarse processing state.
//! - [`AppConfig`] — env-driven configuration for the demo binary.

pub mod chain;
pub mod config;
pub mod context;
pub mod observer;

pub use chain::build_blur_chain;
pub use config::AppConfig;
pub use context::BlurContext;
pub use observer::{fold_ui_state, spawn_ui_observer, UiState};
