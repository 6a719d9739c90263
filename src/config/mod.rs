//! Configuration management for the duo-ladder service
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, scoring constants and the tracked roster.

pub mod app;
pub mod roster;
pub mod scoring;

// Re-export commonly used types
pub use app::{
    parse_event_start, validate_config, AppConfig, RiotSettings, ServiceSettings,
    TrackingSettings,
};
pub use roster::{Roster, RosterPair, RosterPlayer};
pub use scoring::{ScoringConfig, SpecialBonusValues, StreakMilestone};
