//! Common types used throughout the duo tracker

use crate::rank::RankInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for registered players
pub type PlayerId = String;

/// Unique identifier for duo pairs
pub type DuoId = String;

/// Match identifier as issued by the telemetry API (e.g. `EUW1_6812345678`)
pub type MatchId = String;

/// Which half of a duo a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSlot {
    Noob,
    Carry,
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerSlot::Noob => write!(f, "noob"),
            PlayerSlot::Carry => write!(f, "carry"),
        }
    }
}

/// Team position as reported by match telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
}

impl Role {
    /// Parse the API's `teamPosition` label; empty or unknown positions map to `None`
    pub fn from_position(position: &str) -> Option<Self> {
        match position.trim().to_ascii_uppercase().as_str() {
            "TOP" => Some(Role::Top),
            "JUNGLE" => Some(Role::Jungle),
            "MIDDLE" | "MID" => Some(Role::Middle),
            "BOTTOM" | "BOT" | "ADC" => Some(Role::Bottom),
            "UTILITY" | "SUPPORT" => Some(Role::Utility),
            _ => None,
        }
    }
}

/// Per-player, per-match telemetry consumed by the scoring pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStats {
    pub player_id: PlayerId,
    pub champion_name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub team_id: u32,
    pub off_role: bool,
    pub off_champion: bool,
    #[serde(default)]
    pub double_kills: Option<u32>,
    #[serde(default)]
    pub triple_kills: Option<u32>,
    #[serde(default)]
    pub quadra_kills: Option<u32>,
    #[serde(default)]
    pub penta_kills: Option<u32>,
    #[serde(default)]
    pub first_blood: Option<bool>,
    /// Rank held when the match was played
    pub rank_before: RankInfo,
    /// Rank observed after the match
    pub rank_after: RankInfo,
}

/// A discovered match for one duo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub duo_id: DuoId,
    pub win: bool,
    pub remake: bool,
    pub surrender: bool,
    pub duration_secs: u32,
    pub game_creation: DateTime<Utc>,
    pub noob: PlayerGameStats,
    pub carry: PlayerGameStats,
    #[serde(default)]
    pub scored: bool,
    #[serde(default)]
    pub points_awarded: i32,
    pub discovered_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn stats(&self, slot: PlayerSlot) -> &PlayerGameStats {
        match slot {
            PlayerSlot::Noob => &self.noob,
            PlayerSlot::Carry => &self.carry,
        }
    }
}

/// A registered player and their running challenge counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    /// Display name, `GameName#TAG`
    pub riot_id: String,
    pub puuid: String,
    pub summoner_id: String,
    pub rank: RankInfo,
    #[serde(default)]
    pub main_roles: Vec<Role>,
    #[serde(default)]
    pub main_champions: Vec<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    /// Positive = consecutive wins, negative = consecutive losses
    #[serde(default)]
    pub streak: i32,
}

impl PlayerRecord {
    pub fn new(
        id: impl Into<PlayerId>,
        riot_id: impl Into<String>,
        puuid: impl Into<String>,
        summoner_id: impl Into<String>,
        rank: RankInfo,
    ) -> Self {
        Self {
            id: id.into(),
            riot_id: riot_id.into(),
            puuid: puuid.into(),
            summoner_id: summoner_id.into(),
            rank,
            main_roles: Vec::new(),
            main_champions: Vec::new(),
            points: 0,
            wins: 0,
            losses: 0,
            streak: 0,
        }
    }

    /// Playing outside the declared main roles; no declaration means never off-role
    pub fn is_off_role(&self, role: Option<Role>) -> bool {
        if self.main_roles.is_empty() {
            return false;
        }
        match role {
            Some(role) => !self.main_roles.contains(&role),
            None => false,
        }
    }

    /// Playing a champion outside the declared pool; no declaration means never off-champion
    pub fn is_off_champion(&self, champion_name: &str) -> bool {
        if self.main_champions.is_empty() {
            return false;
        }
        !self
            .main_champions
            .iter()
            .any(|main| main.eq_ignore_ascii_case(champion_name))
    }
}

/// Two linked players tracked as one challenge entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuoPair {
    pub id: DuoId,
    pub name: String,
    pub noob_id: PlayerId,
    pub carry_id: PlayerId,
    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub streak: i32,
    pub created_at: DateTime<Utc>,
}

impl DuoPair {
    pub fn player_id(&self, slot: PlayerSlot) -> &PlayerId {
        match slot {
            PlayerSlot::Noob => &self.noob_id,
            PlayerSlot::Carry => &self.carry_id,
        }
    }
}
