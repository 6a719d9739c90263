//! Special (per-player) and pair-level bonuses

use crate::config::ScoringConfig;
use crate::scoring::result::{RiskBonus, SpecialBonuses};
use crate::types::PlayerGameStats;

/// Feat awards for one player
pub fn special_bonuses(config: &ScoringConfig, stats: &PlayerGameStats) -> SpecialBonuses {
    let values = &config.special_bonuses;
    let count = |counter: Option<u32>| counter.unwrap_or(0) as i32;

    SpecialBonuses {
        pentakill: values.pentakill * count(stats.penta_kills),
        quadrakill: values.quadrakill * count(stats.quadra_kills),
        triple_kill: values.triple_kill * count(stats.triple_kills),
        double_kill: values.double_kill * count(stats.double_kills),
        first_blood: if stats.first_blood.unwrap_or(false) {
            values.first_blood
        } else {
            0
        },
    }
}

/// Count of off-role/off-champion flags across both players
pub fn h_score(noob: &PlayerGameStats, carry: &PlayerGameStats) -> u8 {
    [
        noob.off_role,
        noob.off_champion,
        carry.off_role,
        carry.off_champion,
    ]
    .into_iter()
    .filter(|flag| *flag)
    .count() as u8
}

pub fn risk_bonus(config: &ScoringConfig, noob: &PlayerGameStats, carry: &PlayerGameStats) -> RiskBonus {
    let h_score = h_score(noob, carry);
    let final_points = match h_score {
        4 => config.risk_bonus_full,
        3 => config.risk_bonus_high,
        _ => 0,
    };

    RiskBonus {
        h_score,
        final_points,
    }
}

/// Bonus when neither player died
pub fn no_death_bonus(config: &ScoringConfig, noob: &PlayerGameStats, carry: &PlayerGameStats) -> i32 {
    if noob.deaths == 0 && carry.deaths == 0 {
        config.no_death_bonus
    } else {
        0
    }
}
