//! Rank fairness multiplier
//!
//! Discounts the weaker half of a badly mismatched duo. A player whose value
//! is within one tier-width of the pair average keeps full points; below that,
//! every step of deficit costs `1 / deficit_divisor` down to the floor.

use crate::rank::value::RankInfo;
use serde::{Deserialize, Serialize};

/// Tunable parameters of the multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessParams {
    /// Allowed distance below the pair average before any discount
    pub tier_width: f64,
    /// Deficit that would wipe out all points (before the floor applies)
    pub deficit_divisor: f64,
    /// Lowest multiplier ever returned
    pub floor: f64,
}

impl Default for FairnessParams {
    fn default() -> Self {
        Self {
            tier_width: 4.0,
            deficit_divisor: 20.0,
            floor: 0.5,
        }
    }
}

impl FairnessParams {
    /// Multiplier for `self_rank` paired with `partner_rank`, in `[floor, 1.0]`
    pub fn multiplier(&self, self_rank: &RankInfo, partner_rank: &RankInfo) -> f64 {
        let own = self_rank.value() as f64;
        let partner = partner_rank.value() as f64;

        let average = (own + partner) / 2.0;
        let threshold = average - self.tier_width;

        if own >= threshold {
            return 1.0;
        }

        let deficit = threshold - own;
        (1.0 - deficit / self.deficit_divisor).max(self.floor)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.tier_width < 0.0 {
            return Err(crate::error::TrackerError::ConfigurationError {
                message: "fairness tier_width must be non-negative".to_string(),
            }
            .into());
        }
        if self.deficit_divisor <= 0.0 {
            return Err(crate::error::TrackerError::ConfigurationError {
                message: "fairness deficit_divisor must be positive".to_string(),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.floor) {
            return Err(crate::error::TrackerError::ConfigurationError {
                message: "fairness floor must be within [0, 1]".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Multiplier with the default parameters
pub fn fairness_multiplier(self_rank: &RankInfo, partner_rank: &RankInfo) -> f64 {
    FairnessParams::default().multiplier(self_rank, partner_rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::value::{Division, Tier};

    #[test]
    fn test_equal_ranks_are_not_discounted() {
        let gold = RankInfo::divided(Tier::Gold, Division::II);
        assert_eq!(fairness_multiplier(&gold, &gold), 1.0);
    }

    #[test]
    fn test_bronze_with_diamond_partner() {
        let noob = RankInfo::divided(Tier::Bronze, Division::III);
        let carry = RankInfo::divided(Tier::Diamond, Division::II);

        let noob_multiplier = fairness_multiplier(&noob, &carry);
        let carry_multiplier = fairness_multiplier(&carry, &noob);

        // avg 15.5, threshold 11.5, deficit 6.5
        assert!((noob_multiplier - 0.675).abs() < 1e-9);
        assert!((noob_multiplier - 0.65).abs() <= 0.05);
        assert_eq!(carry_multiplier, 1.0);
    }

    #[test]
    fn test_within_one_tier_width_of_average() {
        // values 12 and 20: avg 16, threshold 12
        let low = RankInfo::divided(Tier::Gold, Division::IV);
        let high = RankInfo::divided(Tier::Emerald, Division::IV);
        assert_eq!(fairness_multiplier(&low, &high), 1.0);

        // values 11 and 20: avg 15.5, threshold 11.5, deficit 0.5
        let lower = RankInfo::divided(Tier::Silver, Division::I);
        assert!((fairness_multiplier(&lower, &high) - 0.975).abs() < 1e-9);
    }

    #[test]
    fn test_floor_applies_for_extreme_gaps() {
        let iron = RankInfo::divided(Tier::Iron, Division::IV);
        let challenger = RankInfo::apex(Tier::Challenger);
        // avg 18, threshold 14, deficit 14 -> 0.3 before the floor
        assert_eq!(fairness_multiplier(&iron, &challenger), 0.5);
        assert_eq!(fairness_multiplier(&challenger, &iron), 1.0);
    }

    #[test]
    fn test_params_validation() {
        assert!(FairnessParams::default().validate().is_ok());

        let params = FairnessParams {
            deficit_divisor: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = FairnessParams {
            floor: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
