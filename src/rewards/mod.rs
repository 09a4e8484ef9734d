//! Rewards activation module
//!
//! Opens the rewards pages, discovers and clicks task cards, then reconciles
//! the tabs those clicks spawned.

mod activator;
mod discovery;
mod tabs;

pub use activator::RewardsActivator;
