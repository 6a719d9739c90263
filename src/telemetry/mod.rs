//! Match-telemetry collaborator
//!
//! The scheduler talks to the game's match-history service only through the
//! [`MatchTelemetry`] trait. [`RiotTelemetryClient`] is the HTTP
//! implementation; tests script their own.

pub mod riot;

pub use riot::{RiotClientConfig, RiotTelemetryClient};

use crate::error::TelemetryError;
use crate::rank::RankInfo;
use crate::types::{MatchId, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One participant's line in a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStats {
    pub puuid: String,
    pub summoner_id: String,
    pub team_id: u32,
    pub champion_id: u32,
    pub champion_name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub team_position: Option<Role>,
    pub win: bool,
    pub early_surrender: bool,
    pub surrender: bool,
    pub double_kills: u32,
    pub triple_kills: u32,
    pub quadra_kills: u32,
    pub penta_kills: u32,
    pub first_blood: bool,
}

/// Full details of one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub match_id: MatchId,
    pub game_creation: DateTime<Utc>,
    pub duration_secs: u32,
    pub queue_id: u16,
    pub participants: Vec<ParticipantStats>,
}

impl MatchDetails {
    pub fn participant(&self, puuid: &str) -> Option<&ParticipantStats> {
        self.participants.iter().find(|p| p.puuid == puuid)
    }
}

/// Source of match history, match details and current ranks
#[async_trait]
pub trait MatchTelemetry: Send + Sync {
    /// Most recent match ids for a player in one queue, newest first
    async fn recent_match_ids(
        &self,
        puuid: &str,
        count: u32,
        queue_id: u16,
        start_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<MatchId>, TelemetryError>;

    /// Full details of one match
    async fn match_details(&self, match_id: &str) -> Result<MatchDetails, TelemetryError>;

    /// Current solo-queue rank, `None` when the player is unranked
    async fn rank_by_summoner_id(
        &self,
        summoner_id: &str,
    ) -> Result<Option<RankInfo>, TelemetryError>;
}
