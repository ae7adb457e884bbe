//! Shared test fixtures and utilities for stride crates.
//!
//! Provides ready-made robot configurations, scripted solver backends and
//! deterministic RNG setup.

pub mod fixtures;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{monoped_model, monoped_params, quadruped_params, walk_base};
pub use mocks::{FailingBackend, ScriptedBackend};
pub use rng::{deterministic_vec, seeded_rng};
