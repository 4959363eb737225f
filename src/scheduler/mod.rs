//! Round scheduling
//!
//! The [`EventManager`] owns every piece of per-round mutable state: the
//! materialized instances, the pending/active lists, the pacing threshold
//! and cooldown, and the round random generator. It runs authoritatively on
//! one side of a session; peers only ever receive intensity values and
//! pre-decided spawn results.

mod manager;

#[cfg(test)]
mod property_tests;

pub use manager::EventManager;
