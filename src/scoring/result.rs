//! Scoring pipeline output types

use crate::types::PlayerSlot;
use serde::{Deserialize, Serialize};

/// Qualitative trigger encountered while scoring; never affects points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Remake,
    Surrender,
    Pentakill,
    Quadrakill,
    FirstBlood,
    WinStreakMilestone,
    LossStreakMilestone,
    RankPenalty,
    IndividualCap,
    NoDeath,
    HighRisk,
    PairCap,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Remake => "remake",
            AlertKind::Surrender => "surrender",
            AlertKind::Pentakill => "pentakill",
            AlertKind::Quadrakill => "quadrakill",
            AlertKind::FirstBlood => "first_blood",
            AlertKind::WinStreakMilestone => "win_streak_milestone",
            AlertKind::LossStreakMilestone => "loss_streak_milestone",
            AlertKind::RankPenalty => "rank_penalty",
            AlertKind::IndividualCap => "individual_cap",
            AlertKind::NoDeath => "no_death",
            AlertKind::HighRisk => "high_risk",
            AlertKind::PairCap => "pair_cap",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerSlot>,
}

impl Alert {
    pub fn pair(kind: AlertKind) -> Self {
        Self { kind, player: None }
    }

    pub fn player(kind: AlertKind, slot: PlayerSlot) -> Self {
        Self {
            kind,
            player: Some(slot),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResultScore {
    #[serde(rename = "final")]
    pub final_points: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakScore {
    pub progressive: i32,
    pub milestone: i32,
    pub total: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialBonuses {
    pub pentakill: i32,
    pub quadrakill: i32,
    pub triple_kill: i32,
    pub double_kill: i32,
    pub first_blood: i32,
}

impl SpecialBonuses {
    pub fn total(&self) -> i32 {
        self.pentakill + self.quadrakill + self.triple_kill + self.double_kill + self.first_blood
    }
}

/// One player's breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub game_result: GameResultScore,
    pub streak: StreakScore,
    pub special_bonuses: SpecialBonuses,
    /// Sum before fairness scaling
    pub raw: i32,
    pub multiplier: f64,
    pub scaled: i32,
    /// Individually capped award; this is the player's final value
    pub capped: i32,
    /// Streak counter the caller should store after this match
    pub new_streak: i32,
}

impl PlayerScore {
    /// Score for a match that did not count
    pub fn void(prior_streak: i32) -> Self {
        Self {
            game_result: GameResultScore::default(),
            streak: StreakScore::default(),
            special_bonuses: SpecialBonuses::default(),
            raw: 0,
            multiplier: 1.0,
            scaled: 0,
            capped: 0,
            new_streak: prior_streak,
        }
    }

    pub fn final_points(&self) -> i32 {
        self.capped
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBonus {
    /// Count of off-role/off-champion flags across both players (0..=4)
    pub h_score: u8,
    #[serde(rename = "final")]
    pub final_points: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairScore {
    pub no_death_bonus: i32,
    pub risk_bonus: RiskBonus,
    pub raw: i32,
    pub capped: i32,
}

/// Complete result of scoring one match for a duo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub noob: PlayerScore,
    pub carry: PlayerScore,
    pub pair: PairScore,
    /// Always equal to `pair.capped`
    pub total: i32,
    pub is_remake_or_early_game: bool,
    pub alerts: Vec<Alert>,
}

impl ScoreResult {
    pub fn player(&self, slot: PlayerSlot) -> &PlayerScore {
        match slot {
            PlayerSlot::Noob => &self.noob,
            PlayerSlot::Carry => &self.carry,
        }
    }

    pub fn has_alert(&self, kind: AlertKind) -> bool {
        self.alerts.iter().any(|alert| alert.kind == kind)
    }

    pub fn has_player_alert(&self, kind: AlertKind, slot: PlayerSlot) -> bool {
        self.alerts.contains(&Alert::player(kind, slot))
    }
}
