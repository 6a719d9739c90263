//! Process-lifetime state for tracked duos
//!
//! The store is an explicitly owned object passed to the scheduler and to
//! presentation collaborators; snapshot/restore is the hook for any future
//! durability layer.

pub mod memory;

pub use memory::{StoreSnapshot, StoreStats, TrackerStore};
