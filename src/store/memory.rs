//! In-memory tracker state
//!
//! Holds registered players, duo pairs and every discovered match. The match
//! table doubles as the dedup barrier: a match id present here is never
//! fetched or scored again. The service wraps the store in
//! `Arc<tokio::sync::RwLock<_>>` and the scheduler is its only writer.

use crate::error::TrackerError;
use crate::scoring::{next_streak, ScoreResult};
use crate::types::{DuoId, DuoPair, MatchId, MatchRecord, PlayerId, PlayerRecord, PlayerSlot};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Aggregate counters for health reporting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub players: usize,
    pub tracked_pairs: usize,
    pub matches_stored: usize,
    pub matches_scored: usize,
    pub matches_rejected: usize,
}

/// Serialisable copy of the whole store, for a durability layer at the boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub players: Vec<PlayerRecord>,
    pub pairs: Vec<DuoPair>,
    pub matches: Vec<MatchRecord>,
    pub rejected_matches: Vec<MatchId>,
    pub taken_at: DateTime<Utc>,
}

/// Owned state of the challenge
#[derive(Debug, Default)]
pub struct TrackerStore {
    players: HashMap<PlayerId, PlayerRecord>,
    // ordered so polling visits pairs deterministically
    pairs: BTreeMap<DuoId, DuoPair>,
    player_duo: HashMap<PlayerId, DuoId>,
    matches: HashMap<MatchId, MatchRecord>,
    rejected_matches: HashSet<MatchId>,
}

impl TrackerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_player(&mut self, player: PlayerRecord) -> crate::error::Result<()> {
        if self.players.contains_key(&player.id) {
            return Err(TrackerError::PlayerAlreadyRegistered {
                player_id: player.id,
            }
            .into());
        }
        self.players.insert(player.id.clone(), player);
        Ok(())
    }

    /// Link two registered players into a tracked duo
    pub fn create_pair(
        &mut self,
        duo_id: impl Into<DuoId>,
        name: impl Into<String>,
        noob_id: &str,
        carry_id: &str,
    ) -> crate::error::Result<DuoPair> {
        let duo_id = duo_id.into();

        if self.pairs.contains_key(&duo_id) {
            return Err(TrackerError::DuoAlreadyExists { duo_id }.into());
        }
        if noob_id == carry_id {
            return Err(TrackerError::InvalidDuo {
                duo_id,
                reason: "noob and carry must be different players".to_string(),
            }
            .into());
        }
        for player_id in [noob_id, carry_id] {
            if !self.players.contains_key(player_id) {
                return Err(TrackerError::PlayerNotFound {
                    player_id: player_id.to_string(),
                }
                .into());
            }
            if let Some(existing) = self.player_duo.get(player_id) {
                return Err(TrackerError::PlayerAlreadyPaired {
                    player_id: player_id.to_string(),
                    duo_id: existing.clone(),
                }
                .into());
            }
        }

        let pair = DuoPair {
            id: duo_id.clone(),
            name: name.into(),
            noob_id: noob_id.to_string(),
            carry_id: carry_id.to_string(),
            total_points: 0,
            wins: 0,
            losses: 0,
            streak: 0,
            created_at: current_timestamp(),
        };

        self.player_duo.insert(noob_id.to_string(), duo_id.clone());
        self.player_duo.insert(carry_id.to_string(), duo_id.clone());
        self.pairs.insert(duo_id, pair.clone());
        Ok(pair)
    }

    pub fn tracked_pairs(&self) -> Vec<DuoPair> {
        self.pairs.values().cloned().collect()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn pair(&self, duo_id: &str) -> Option<&DuoPair> {
        self.pairs.get(duo_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerRecord> {
        self.players.get(player_id)
    }

    /// Both members of a duo, noob first
    pub fn pair_members(
        &self,
        duo_id: &str,
    ) -> crate::error::Result<(DuoPair, PlayerRecord, PlayerRecord)> {
        let pair = self
            .pairs
            .get(duo_id)
            .ok_or_else(|| TrackerError::DuoNotFound {
                duo_id: duo_id.to_string(),
            })?;
        let noob = self.require_player(&pair.noob_id)?;
        let carry = self.require_player(&pair.carry_id)?;
        Ok((pair.clone(), noob.clone(), carry.clone()))
    }

    pub fn contains_match(&self, match_id: &str) -> bool {
        self.matches.contains_key(match_id)
    }

    /// Stored or previously rejected; either way it must not be fetched again
    pub fn is_known_match(&self, match_id: &str) -> bool {
        self.matches.contains_key(match_id) || self.rejected_matches.contains(match_id)
    }

    pub fn match_record(&self, match_id: &str) -> Option<&MatchRecord> {
        self.matches.get(match_id)
    }

    /// Matches of one duo, oldest first
    pub fn matches_for_pair(&self, duo_id: &str) -> Vec<MatchRecord> {
        let mut records: Vec<MatchRecord> = self
            .matches
            .values()
            .filter(|record| record.duo_id == duo_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.game_creation.cmp(&b.game_creation));
        records
    }

    /// Insert a newly discovered match. Returns false (and leaves the existing
    /// record untouched) when the id is already present.
    pub fn insert_match(&mut self, record: MatchRecord) -> bool {
        if self.matches.contains_key(&record.match_id) {
            return false;
        }
        self.matches.insert(record.match_id.clone(), record);
        true
    }

    pub fn reject_match(&mut self, match_id: impl Into<MatchId>) {
        self.rejected_matches.insert(match_id.into());
    }

    /// Flip the scored flag; the only mutation a stored match ever receives
    pub fn mark_scored(&mut self, match_id: &str, points: i32) -> crate::error::Result<()> {
        let record = self
            .matches
            .get_mut(match_id)
            .ok_or_else(|| TrackerError::MatchNotFound {
                match_id: match_id.to_string(),
            })?;

        if record.scored {
            return Err(TrackerError::MatchAlreadyScored {
                match_id: match_id.to_string(),
            }
            .into());
        }

        record.scored = true;
        record.points_awarded = points;
        Ok(())
    }

    /// Fold a scoring result into the duo and player counters.
    ///
    /// Void matches (remakes, early endings) leave every counter untouched.
    pub fn apply_score(
        &mut self,
        record: &MatchRecord,
        result: &ScoreResult,
    ) -> crate::error::Result<()> {
        if result.is_remake_or_early_game {
            return Ok(());
        }

        let pair = self
            .pairs
            .get_mut(&record.duo_id)
            .ok_or_else(|| TrackerError::DuoNotFound {
                duo_id: record.duo_id.clone(),
            })?;

        pair.total_points += i64::from(result.total);
        pair.streak = next_streak(pair.streak, record.win);
        if record.win {
            pair.wins += 1;
        } else {
            pair.losses += 1;
        }

        let members = [
            (PlayerSlot::Noob, pair.noob_id.clone()),
            (PlayerSlot::Carry, pair.carry_id.clone()),
        ];

        for (slot, player_id) in members {
            let score = result.player(slot);
            let stats = record.stats(slot);
            let player =
                self.players
                    .get_mut(&player_id)
                    .ok_or_else(|| TrackerError::PlayerNotFound {
                        player_id: player_id.clone(),
                    })?;

            player.points += i64::from(score.final_points());
            player.streak = score.new_streak;
            player.rank = stats.rank_after;
            if record.win {
                player.wins += 1;
            } else {
                player.losses += 1;
            }
        }

        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            players: self.players.len(),
            tracked_pairs: self.pairs.len(),
            matches_stored: self.matches.len(),
            matches_scored: self.matches.values().filter(|m| m.scored).count(),
            matches_rejected: self.rejected_matches.len(),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let mut players: Vec<PlayerRecord> = self.players.values().cloned().collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));

        let mut matches: Vec<MatchRecord> = self.matches.values().cloned().collect();
        matches.sort_by(|a, b| a.match_id.cmp(&b.match_id));

        let mut rejected_matches: Vec<MatchId> = self.rejected_matches.iter().cloned().collect();
        rejected_matches.sort();

        StoreSnapshot {
            players,
            pairs: self.pairs.values().cloned().collect(),
            matches,
            rejected_matches,
            taken_at: current_timestamp(),
        }
    }

    /// Rebuild a store from a snapshot, re-checking pair membership
    pub fn restore(snapshot: StoreSnapshot) -> crate::error::Result<Self> {
        let mut store = Self::new();

        for player in snapshot.players {
            store.register_player(player)?;
        }

        for pair in snapshot.pairs {
            for player_id in [&pair.noob_id, &pair.carry_id] {
                store.require_player(player_id)?;
                if let Some(existing) = store.player_duo.get(player_id) {
                    return Err(TrackerError::PlayerAlreadyPaired {
                        player_id: player_id.clone(),
                        duo_id: existing.clone(),
                    }
                    .into());
                }
                store.player_duo.insert(player_id.clone(), pair.id.clone());
            }
            store.pairs.insert(pair.id.clone(), pair);
        }

        for record in snapshot.matches {
            store.matches.insert(record.match_id.clone(), record);
        }
        store.rejected_matches.extend(snapshot.rejected_matches);

        Ok(store)
    }

    fn require_player(&self, player_id: &str) -> crate::error::Result<&PlayerRecord> {
        self.players.get(player_id).ok_or_else(|| {
            TrackerError::PlayerNotFound {
                player_id: player_id.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::{Division, RankInfo, Tier};
    use crate::scoring::ScoringPipeline;
    use crate::types::PlayerGameStats;

    fn gold() -> RankInfo {
        RankInfo::divided(Tier::Gold, Division::II)
    }

    fn store_with_pair() -> TrackerStore {
        let mut store = TrackerStore::new();
        store
            .register_player(PlayerRecord::new("n", "Noob#1", "puuid-n", "sum-n", gold()))
            .unwrap();
        store
            .register_player(PlayerRecord::new("c", "Carry#1", "puuid-c", "sum-c", gold()))
            .unwrap();
        store.create_pair("duo-1", "Team One", "n", "c").unwrap();
        store
    }

    fn stats(player_id: &str, rank_after: RankInfo) -> PlayerGameStats {
        PlayerGameStats {
            player_id: player_id.to_string(),
            champion_name: "Garen".to_string(),
            kills: 3,
            deaths: 2,
            assists: 5,
            team_id: 200,
            off_role: false,
            off_champion: false,
            double_kills: None,
            triple_kills: None,
            quadra_kills: None,
            penta_kills: None,
            first_blood: None,
            rank_before: gold(),
            rank_after,
        }
    }

    fn record(match_id: &str, win: bool) -> MatchRecord {
        MatchRecord {
            match_id: match_id.to_string(),
            duo_id: "duo-1".to_string(),
            win,
            remake: false,
            surrender: false,
            duration_secs: 1800,
            game_creation: current_timestamp(),
            noob: stats("n", RankInfo::divided(Tier::Gold, Division::I)),
            carry: stats("c", gold()),
            scored: false,
            points_awarded: 0,
            discovered_at: current_timestamp(),
        }
    }

    #[test]
    fn test_create_pair_validation() {
        let mut store = store_with_pair();

        assert!(store.create_pair("duo-1", "Again", "n", "c").is_err());

        store
            .register_player(PlayerRecord::new("x", "X#1", "puuid-x", "sum-x", gold()))
            .unwrap();
        assert!(store.create_pair("duo-2", "Self", "x", "x").is_err());
        assert!(store.create_pair("duo-2", "Taken", "x", "c").is_err());
        assert!(store.create_pair("duo-2", "Ghost", "x", "missing").is_err());
        assert_eq!(store.pair_count(), 1);
    }

    #[test]
    fn test_duplicate_player_registration() {
        let mut store = store_with_pair();
        let result =
            store.register_player(PlayerRecord::new("n", "Noob#2", "puuid-z", "sum-z", gold()));
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_match_is_a_dedup_barrier() {
        let mut store = store_with_pair();
        assert!(store.insert_match(record("EUW1_1", true)));

        let mut duplicate = record("EUW1_1", false);
        duplicate.duration_secs = 999;
        assert!(!store.insert_match(duplicate));

        let stored = store.match_record("EUW1_1").unwrap();
        assert!(stored.win);
        assert_eq!(stored.duration_secs, 1800);
    }

    #[test]
    fn test_mark_scored_only_once() {
        let mut store = store_with_pair();
        store.insert_match(record("EUW1_1", true));

        store.mark_scored("EUW1_1", 42).unwrap();
        assert!(store.match_record("EUW1_1").unwrap().scored);
        assert_eq!(store.match_record("EUW1_1").unwrap().points_awarded, 42);

        assert!(store.mark_scored("EUW1_1", 42).is_err());
        assert!(store.mark_scored("EUW1_404", 1).is_err());
    }

    #[test]
    fn test_rejected_matches_are_known() {
        let mut store = store_with_pair();
        assert!(!store.is_known_match("EUW1_9"));
        store.reject_match("EUW1_9");
        assert!(store.is_known_match("EUW1_9"));
        assert!(!store.contains_match("EUW1_9"));
    }

    #[test]
    fn test_apply_score_updates_counters() {
        let mut store = store_with_pair();
        let pipeline = ScoringPipeline::default();
        let game = record("EUW1_1", true);
        let result = pipeline.score(&game, 0, 0);

        store.apply_score(&game, &result).unwrap();

        let pair = store.pair("duo-1").unwrap();
        assert_eq!(pair.total_points, i64::from(result.total));
        assert_eq!(pair.wins, 1);
        assert_eq!(pair.streak, 1);

        let noob = store.player("n").unwrap();
        assert_eq!(noob.points, i64::from(result.noob.final_points()));
        assert_eq!(noob.streak, 1);
        assert_eq!(noob.rank, RankInfo::divided(Tier::Gold, Division::I));

        let loss = record("EUW1_2", false);
        let result = pipeline.score(&loss, noob.streak, 1);
        store.apply_score(&loss, &result).unwrap();

        let pair = store.pair("duo-1").unwrap();
        assert_eq!(pair.losses, 1);
        assert_eq!(pair.streak, -1);
        assert_eq!(store.player("c").unwrap().streak, -1);
    }

    #[test]
    fn test_apply_score_ignores_remakes() {
        let mut store = store_with_pair();
        let mut game = record("EUW1_1", true);
        game.remake = true;
        let result = ScoringPipeline::default().score(&game, 0, 0);

        store.apply_score(&game, &result).unwrap();

        let pair = store.pair("duo-1").unwrap();
        assert_eq!(pair.wins, 0);
        assert_eq!(pair.total_points, 0);
        assert_eq!(store.player("n").unwrap().rank, gold());
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut store = store_with_pair();
        store.insert_match(record("EUW1_1", true));
        store.mark_scored("EUW1_1", 40).unwrap();
        store.reject_match("EUW1_2");

        let snapshot = store.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: StoreSnapshot = serde_json::from_str(&json).unwrap();

        let restored = TrackerStore::restore(parsed).unwrap();
        assert_eq!(restored.stats(), store.stats());
        assert!(restored.is_known_match("EUW1_2"));
        assert!(restored.match_record("EUW1_1").unwrap().scored);
        assert_eq!(restored.pair("duo-1"), store.pair("duo-1"));
    }

    #[test]
    fn test_restore_rejects_double_membership() {
        let store = store_with_pair();
        let mut snapshot = store.snapshot();
        let mut clone = snapshot.pairs[0].clone();
        clone.id = "duo-2".to_string();
        snapshot.pairs.push(clone);

        assert!(TrackerStore::restore(snapshot).is_err());
    }

    #[test]
    fn test_stats() {
        let mut store = store_with_pair();
        store.insert_match(record("EUW1_1", true));
        store.insert_match(record("EUW1_2", true));
        store.mark_scored("EUW1_2", 20).unwrap();
        store.reject_match("EUW1_3");

        let stats = store.stats();
        assert_eq!(stats.players, 2);
        assert_eq!(stats.tracked_pairs, 1);
        assert_eq!(stats.matches_stored, 2);
        assert_eq!(stats.matches_scored, 1);
        assert_eq!(stats.matches_rejected, 1);
    }
}
