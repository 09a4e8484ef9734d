//! Search module
//!
//! Owns the single dedicated search tab and drives one simulated search
//! per scheduled action.

mod actor;

pub use actor::SearchActor;
