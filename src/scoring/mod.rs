//! Match scoring
//!
//! This module contains the pure scoring pipeline that converts one completed
//! match into signed point awards for a duo, plus its building blocks.

pub mod bonuses;
pub mod pipeline;
pub mod result;
pub mod streak;

// Re-export commonly used types
pub use pipeline::ScoringPipeline;
pub use result::{
    Alert, AlertKind, GameResultScore, PairScore, PlayerScore, RiskBonus, ScoreResult,
    SpecialBonuses, StreakScore,
};
pub use streak::next_streak;
