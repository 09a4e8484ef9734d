//! Settings module
//!
//! Durable configuration record shared by the scheduler, run executor and
//! control surface, with change notifications.

mod store;

pub use store::{RunState, Settings, SettingsStore};
