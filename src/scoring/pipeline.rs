//! Deterministic scoring pipeline
//!
//! Turns one match into point awards for both players and their duo. The
//! stages run in a fixed order:
//!
//! 1. remake / early-game gate
//! 2. base game-result points
//! 3. streak bonus from each player's prior counter
//! 4. special (feat) bonuses
//! 5. per-player raw total
//! 6. rank-fairness scaling against the partner's rank
//! 7. individual cap
//! 8. pair bonuses (no-death, risk)
//! 9. pair total and cap
//! 10. alerts
//!
//! The pipeline is pure and total: it never fails and never mutates counters.
//! Callers must only pass matches where both players were on the same team.

use crate::config::ScoringConfig;
use crate::scoring::bonuses::{no_death_bonus, risk_bonus, special_bonuses};
use crate::scoring::result::{
    Alert, AlertKind, GameResultScore, PairScore, PlayerScore, ScoreResult,
};
use crate::scoring::streak::streak_score;
use crate::types::{MatchRecord, PlayerGameStats, PlayerSlot};
use crate::utils::scale_points;

/// Scoring pipeline bound to one set of constants
#[derive(Debug, Clone, Default)]
pub struct ScoringPipeline {
    config: ScoringConfig,
}

impl ScoringPipeline {
    pub fn new(config: ScoringConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Whether a match is void (remade or ended before the minimum duration)
    pub fn is_remake_or_early_game(&self, record: &MatchRecord) -> bool {
        record.remake || record.duration_secs < self.config.min_game_duration_secs
    }

    /// Score a match given each player's streak counter before it
    pub fn score(
        &self,
        record: &MatchRecord,
        noob_prior_streak: i32,
        carry_prior_streak: i32,
    ) -> ScoreResult {
        if self.is_remake_or_early_game(record) {
            return ScoreResult {
                noob: PlayerScore::void(noob_prior_streak),
                carry: PlayerScore::void(carry_prior_streak),
                pair: PairScore::default(),
                total: 0,
                is_remake_or_early_game: true,
                alerts: vec![Alert::pair(AlertKind::Remake)],
            };
        }

        let mut alerts = Vec::new();
        let conceded = !record.win && record.surrender;
        if conceded {
            alerts.push(Alert::pair(AlertKind::Surrender));
        }

        let base = self.game_result_points(record);

        let noob = self.score_player(
            PlayerSlot::Noob,
            record,
            &record.noob,
            &record.carry,
            base,
            noob_prior_streak,
            &mut alerts,
        );
        let carry = self.score_player(
            PlayerSlot::Carry,
            record,
            &record.carry,
            &record.noob,
            base,
            carry_prior_streak,
            &mut alerts,
        );

        let no_death_bonus = no_death_bonus(&self.config, &record.noob, &record.carry);
        if no_death_bonus != 0 {
            alerts.push(Alert::pair(AlertKind::NoDeath));
        }

        let risk_bonus = risk_bonus(&self.config, &record.noob, &record.carry);
        if risk_bonus.h_score >= 3 {
            alerts.push(Alert::pair(AlertKind::HighRisk));
        }

        let pair_raw = noob.capped + carry.capped + no_death_bonus + risk_bonus.final_points;
        let pair_capped = pair_raw.clamp(self.config.pair_min, self.config.pair_max);
        if pair_capped != pair_raw {
            alerts.push(Alert::pair(AlertKind::PairCap));
        }

        ScoreResult {
            noob,
            carry,
            pair: PairScore {
                no_death_bonus,
                risk_bonus,
                raw: pair_raw,
                capped: pair_capped,
            },
            total: pair_capped,
            is_remake_or_early_game: false,
            alerts,
        }
    }

    /// Base points shared by both players; KDA plays no role here
    fn game_result_points(&self, record: &MatchRecord) -> i32 {
        match (record.win, record.surrender) {
            (true, _) if record.duration_secs < self.config.fast_win_threshold_secs => {
                self.config.fast_win_points
            }
            (true, _) => self.config.win_points,
            (false, true) => self.config.surrender_loss_points,
            (false, false) => self.config.loss_points,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn score_player(
        &self,
        slot: PlayerSlot,
        record: &MatchRecord,
        own: &PlayerGameStats,
        partner: &PlayerGameStats,
        base: i32,
        prior_streak: i32,
        alerts: &mut Vec<Alert>,
    ) -> PlayerScore {
        let streak = streak_score(&self.config, prior_streak, record.win);
        let special = special_bonuses(&self.config, own);

        let raw = base + streak.total + special.total();
        let multiplier = self
            .config
            .fairness
            .multiplier(&own.rank_before, &partner.rank_before);
        let scaled = scale_points(raw, multiplier);
        let capped = scaled.clamp(self.config.individual_min, self.config.individual_max);

        if special.pentakill > 0 {
            alerts.push(Alert::player(AlertKind::Pentakill, slot));
        }
        if special.quadrakill > 0 {
            alerts.push(Alert::player(AlertKind::Quadrakill, slot));
        }
        if special.first_blood > 0 {
            alerts.push(Alert::player(AlertKind::FirstBlood, slot));
        }
        if streak.milestone > 0 {
            alerts.push(Alert::player(AlertKind::WinStreakMilestone, slot));
        } else if streak.milestone < 0 {
            alerts.push(Alert::player(AlertKind::LossStreakMilestone, slot));
        }
        if multiplier < 1.0 {
            alerts.push(Alert::player(AlertKind::RankPenalty, slot));
        }
        if capped != scaled {
            alerts.push(Alert::player(AlertKind::IndividualCap, slot));
        }

        PlayerScore {
            game_result: GameResultScore { final_points: base },
            streak,
            special_bonuses: special,
            raw,
            multiplier,
            scaled,
            capped,
            new_streak: streak.progressive,
        }
    }
}
