//! Scoring pipeline constants
//!
//! Every point value the pipeline awards lives here so the product side can
//! tune them without touching the pipeline. Defaults are the challenge rules.

use crate::error::TrackerError;
use crate::rank::FairnessParams;
use serde::{Deserialize, Serialize};

/// One step of the streak milestone schedule, applied symmetrically to losses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakMilestone {
    /// Streak length (absolute) at which the bonus triggers
    pub count: u32,
    pub bonus: i32,
}

/// Points awarded for discrete match feats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialBonusValues {
    pub pentakill: i32,
    pub quadrakill: i32,
    pub triple_kill: i32,
    pub double_kill: i32,
    pub first_blood: i32,
}

impl Default for SpecialBonusValues {
    fn default() -> Self {
        Self {
            pentakill: 30,
            quadrakill: 15,
            triple_kill: 8,
            double_kill: 3,
            first_blood: 5,
        }
    }
}

/// Configuration for the scoring pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Matches shorter than this never count
    pub min_game_duration_secs: u32,
    /// Wins shorter than this earn the fast-win award
    pub fast_win_threshold_secs: u32,
    pub fast_win_points: i32,
    pub win_points: i32,
    pub loss_points: i32,
    pub surrender_loss_points: i32,
    pub individual_min: i32,
    pub individual_max: i32,
    pub pair_min: i32,
    pub pair_max: i32,
    pub no_death_bonus: i32,
    /// Risk bonus when all four off-role/off-champion flags are set
    pub risk_bonus_full: i32,
    /// Risk bonus when exactly three flags are set
    pub risk_bonus_high: i32,
    pub streak_milestones: Vec<StreakMilestone>,
    pub special_bonuses: SpecialBonusValues,
    pub fairness: FairnessParams,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_game_duration_secs: 300,  // 5 minutes
            fast_win_threshold_secs: 1200, // 20 minutes
            fast_win_points: 25,
            win_points: 20,
            loss_points: -20,
            surrender_loss_points: -30,
            streak_milestones: vec![
                StreakMilestone { count: 3, bonus: 10 },
                StreakMilestone { count: 5, bonus: 20 },
            ],
            special_bonuses: SpecialBonusValues::default(),
            fairness: FairnessParams::default(),
            individual_min: -40,
            individual_max: 60,
            pair_min: -70,
            pair_max: 120,
            no_death_bonus: 20,
            risk_bonus_full: 15,
            risk_bonus_high: 10,
        }
    }
}

impl ScoringConfig {
    /// Milestone bonus for a signed streak count; losses mirror wins
    pub fn milestone_for(&self, streak: i32) -> i32 {
        let magnitude = streak.unsigned_abs();
        let bonus = self
            .streak_milestones
            .iter()
            .find(|milestone| milestone.count == magnitude)
            .map(|milestone| milestone.bonus)
            .unwrap_or(0);

        if streak < 0 {
            -bonus
        } else {
            bonus
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.individual_min > self.individual_max {
            return Err(TrackerError::ConfigurationError {
                message: "individual_min must not exceed individual_max".to_string(),
            }
            .into());
        }

        if self.pair_min > self.pair_max {
            return Err(TrackerError::ConfigurationError {
                message: "pair_min must not exceed pair_max".to_string(),
            }
            .into());
        }

        if self.fast_win_threshold_secs <= self.min_game_duration_secs {
            return Err(TrackerError::ConfigurationError {
                message: "fast_win_threshold_secs must be above min_game_duration_secs"
                    .to_string(),
            }
            .into());
        }

        if self
            .streak_milestones
            .iter()
            .any(|milestone| milestone.count == 0 || milestone.bonus < 0)
        {
            return Err(TrackerError::ConfigurationError {
                message: "streak milestones need a positive count and non-negative bonus"
                    .to_string(),
            }
            .into());
        }

        self.fairness.validate()?;
        Ok(())
    }
}
