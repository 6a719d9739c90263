//! Ranked ladder model
//!
//! This module turns tier/division labels into a totally ordered scalar and
//! derives the per-player fairness multiplier used to balance lopsided duos.

pub mod fairness;
pub mod value;

// Re-export commonly used types
pub use fairness::{fairness_multiplier, FairnessParams};
pub use value::{Division, RankInfo, Tier};
