//! Run execution module
//!
//! Orchestrates one end-to-end run: rewards activation, then the paced
//! search sequence with live progress state.

mod executor;

pub use executor::{RunExecutor, RunOutcome, RunPlan};
