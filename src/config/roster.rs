//! Roster of tracked players and duos
//!
//! A TOML file lists every player and how they are paired:
//!
//! ```toml
//! [[players]]
//! id = "ana"
//! riot_id = "Ana#EUW"
//! puuid = "..."
//! summoner_id = "..."
//! tier = "SILVER"
//! division = "II"
//! main_roles = ["UTILITY"]
//!
//! [[pairs]]
//! id = "duo-1"
//! name = "Ana & Bo"
//! noob = "ana"
//! carry = "bo"
//! ```

use crate::error::{Result, TrackerError};
use crate::rank::RankInfo;
use crate::store::TrackerStore;
use crate::types::{PlayerRecord, Role};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub players: Vec<RosterPlayer>,
    #[serde(default)]
    pub pairs: Vec<RosterPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub id: String,
    pub riot_id: String,
    pub puuid: String,
    pub summoner_id: String,
    pub tier: String,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub league_points: u32,
    #[serde(default)]
    pub main_roles: Vec<Role>,
    #[serde(default)]
    pub main_champions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPair {
    pub id: String,
    pub name: String,
    pub noob: String,
    pub carry: String,
}

impl RosterPlayer {
    fn to_record(&self) -> Result<PlayerRecord> {
        let rank = RankInfo::from_labels(&self.tier, self.division.as_deref(), self.league_points)
            .with_context(|| format!("Invalid rank for player '{}'", self.id))?;

        let mut record = PlayerRecord::new(
            self.id.clone(),
            self.riot_id.clone(),
            self.puuid.clone(),
            self.summoner_id.clone(),
            rank,
        );
        record.main_roles = self.main_roles.clone();
        record.main_champions = self.main_champions.clone();
        Ok(record)
    }
}

impl Roster {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid roster {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let roster: Self = toml::from_str(content).context("Failed to parse roster TOML")?;
        if roster.players.iter().any(|p| p.puuid.trim().is_empty()) {
            return Err(TrackerError::ConfigurationError {
                message: "every roster player needs a puuid".to_string(),
            }
            .into());
        }
        Ok(roster)
    }

    /// Register every player and pair. Stops at the first conflict.
    pub fn apply_to(&self, store: &mut TrackerStore) -> Result<()> {
        for player in &self.players {
            store.register_player(player.to_record()?)?;
        }
        for pair in &self.pairs {
            store.create_pair(pair.id.clone(), pair.name.clone(), &pair.noob, &pair.carry)?;
        }

        info!(
            "Roster loaded: {} players, {} pairs",
            self.players.len(),
            self.pairs.len()
        );
        Ok(())
    }
}
