//! Duo Ladder - ranked duo challenge tracker
//!
//! This crate discovers matches played together by registered carry/noob
//! pairs, scores them with a deterministic pipeline that accounts for the
//! rank gap inside each pair, and keeps a running leaderboard.

pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod rank;
pub mod scheduler;
pub mod scoring;
pub mod service;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, TelemetryError, TrackerError};
pub use types::*;

// Re-export key components
pub use notify::{MatchScoredEvent, ScoreNotifier};
pub use rank::{fairness_multiplier, RankInfo};
pub use scheduler::MatchScheduler;
pub use scoring::{ScoreResult, ScoringPipeline};
pub use store::TrackerStore;
pub use telemetry::MatchTelemetry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
