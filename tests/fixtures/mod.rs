//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use duo_ladder::error::{Result, TelemetryError};
use duo_ladder::notify::{MatchScoredEvent, ScoreNotifier};
use duo_ladder::rank::{Division, RankInfo, Tier};
use duo_ladder::scheduler::{MatchScheduler, SchedulerSettings};
use duo_ladder::scoring::ScoringPipeline;
use duo_ladder::store::TrackerStore;
use duo_ladder::telemetry::{MatchDetails, MatchTelemetry, ParticipantStats};
use duo_ladder::types::{MatchId, PlayerRecord, Role};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub const RANKED_SOLO: u16 = 420;
pub const RANKED_FLEX: u16 = 440;

/// Scripted match-history service with call counters
#[derive(Default)]
pub struct ScriptedTelemetry {
    histories: Mutex<HashMap<String, Vec<MatchId>>>,
    details: Mutex<HashMap<MatchId, MatchDetails>>,
    ranks: Mutex<HashMap<String, RankInfo>>,
    history_errors: Mutex<HashMap<String, TelemetryError>>,
    detail_errors: Mutex<HashMap<MatchId, TelemetryError>>,
    history_calls: AtomicUsize,
    detail_calls: Mutex<HashMap<MatchId, usize>>,
    rank_calls: AtomicUsize,
}

impl ScriptedTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a player's history (newest first)
    pub fn set_history(&self, puuid: &str, ids: &[&str]) {
        if let Ok(mut histories) = self.histories.lock() {
            histories.insert(
                puuid.to_string(),
                ids.iter().map(|id| id.to_string()).collect(),
            );
        }
    }

    pub fn add_match(&self, details: MatchDetails) {
        if let Ok(mut map) = self.details.lock() {
            map.insert(details.match_id.clone(), details);
        }
    }

    pub fn set_rank(&self, summoner_id: &str, rank: RankInfo) {
        if let Ok(mut ranks) = self.ranks.lock() {
            ranks.insert(summoner_id.to_string(), rank);
        }
    }

    /// Make history lookups for this player fail until cleared
    pub fn fail_history(&self, puuid: &str, error: TelemetryError) {
        if let Ok(mut errors) = self.history_errors.lock() {
            errors.insert(puuid.to_string(), error);
        }
    }

    /// Make detail lookups for this match fail until cleared
    pub fn fail_details(&self, match_id: &str, error: TelemetryError) {
        if let Ok(mut errors) = self.detail_errors.lock() {
            errors.insert(match_id.to_string(), error);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut errors) = self.history_errors.lock() {
            errors.clear();
        }
        if let Ok(mut errors) = self.detail_errors.lock() {
            errors.clear();
        }
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn rank_calls(&self) -> usize {
        self.rank_calls.load(Ordering::SeqCst)
    }

    /// How many times one match's details were fetched
    pub fn detail_calls(&self, match_id: &str) -> usize {
        self.detail_calls
            .lock()
            .map(|calls| calls.get(match_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_detail_calls(&self) -> usize {
        self.detail_calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MatchTelemetry for ScriptedTelemetry {
    async fn recent_match_ids(
        &self,
        puuid: &str,
        count: u32,
        _queue_id: u16,
        _start_time: Option<DateTime<Utc>>,
    ) -> std::result::Result<Vec<MatchId>, TelemetryError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.history_errors.lock().ok().and_then(|e| e.get(puuid).cloned()) {
            return Err(error);
        }

        Ok(self
            .histories
            .lock()
            .ok()
            .and_then(|h| h.get(puuid).cloned())
            .unwrap_or_default()
            .into_iter()
            .take(count as usize)
            .collect())
    }

    async fn match_details(
        &self,
        match_id: &str,
    ) -> std::result::Result<MatchDetails, TelemetryError> {
        if let Ok(mut calls) = self.detail_calls.lock() {
            *calls.entry(match_id.to_string()).or_insert(0) += 1;
        }

        if let Some(error) = self.detail_errors.lock().ok().and_then(|e| e.get(match_id).cloned()) {
            return Err(error);
        }

        self.details
            .lock()
            .ok()
            .and_then(|d| d.get(match_id).cloned())
            .ok_or(TelemetryError::NotFound {
                resource: format!("match {}", match_id),
            })
    }

    async fn rank_by_summoner_id(
        &self,
        summoner_id: &str,
    ) -> std::result::Result<Option<RankInfo>, TelemetryError> {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .ranks
            .lock()
            .ok()
            .and_then(|r| r.get(summoner_id).copied()))
    }
}

/// Notifier that captures published events for assertions
#[derive(Debug, Default)]
pub struct CapturingNotifier {
    events: Mutex<Vec<MatchScoredEvent>>,
}

impl CapturingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MatchScoredEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ScoreNotifier for CapturingNotifier {
    async fn publish_match_scored(&self, event: MatchScoredEvent) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

/// Notifier that always fails
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl ScoreNotifier for FailingNotifier {
    async fn publish_match_scored(&self, _event: MatchScoredEvent) -> Result<()> {
        Err(anyhow::anyhow!("chat surface unavailable"))
    }
}

pub fn event_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// Player with puuid `p-<id>` and summoner id `s-<id>`
pub fn create_player(id: &str, rank: RankInfo) -> PlayerRecord {
    PlayerRecord::new(
        id,
        format!("{}#EUW", id),
        format!("p-{}", id),
        format!("s-{}", id),
        rank,
    )
}

/// Register `count` pairs named `duo-<i>` with noob `n<i>` (Silver II) and carry `c<i>` (Diamond IV)
pub fn create_test_store(count: usize) -> TrackerStore {
    let mut store = TrackerStore::new();
    for i in 0..count {
        let noob = format!("n{}", i);
        let carry = format!("c{}", i);
        store
            .register_player(create_player(&noob, RankInfo::divided(Tier::Silver, Division::II)))
            .unwrap();
        store
            .register_player(create_player(&carry, RankInfo::divided(Tier::Diamond, Division::IV)))
            .unwrap();
        store
            .create_pair(format!("duo-{}", i), format!("Duo {}", i), &noob, &carry)
            .unwrap();
    }
    store
}

pub fn participant(puuid: &str, team_id: u32, win: bool) -> ParticipantStats {
    ParticipantStats {
        puuid: puuid.to_string(),
        summoner_id: puuid.replacen("p-", "s-", 1),
        team_id,
        champion_id: 103,
        champion_name: "Ahri".to_string(),
        kills: 7,
        deaths: 3,
        assists: 9,
        team_position: Some(Role::Middle),
        win,
        early_surrender: false,
        surrender: false,
        double_kills: 0,
        triple_kills: 0,
        quadra_kills: 0,
        penta_kills: 0,
        first_blood: false,
    }
}

/// A ranked solo match played together on team 100, `hours` after event start
pub fn create_match(match_id: &str, puuids: [&str; 2], win: bool, hours: i64) -> MatchDetails {
    let mut participants = vec![
        participant(puuids[0], 100, win),
        participant(puuids[1], 100, win),
    ];
    for i in 0..8 {
        let team = if i < 3 { 100 } else { 200 };
        let team_win = if team == 100 { win } else { !win };
        participants.push(participant(&format!("p-filler-{}-{}", match_id, i), team, team_win));
    }

    MatchDetails {
        match_id: match_id.to_string(),
        game_creation: event_start() + Duration::hours(hours),
        duration_secs: 1800,
        queue_id: RANKED_SOLO,
        participants,
    }
}

pub fn settings() -> SchedulerSettings {
    SchedulerSettings {
        queue_id: RANKED_SOLO,
        event_start: Some(event_start()),
        ..SchedulerSettings::default()
    }
}

/// Full system over a scripted telemetry source
pub struct TestSystem {
    pub store: Arc<RwLock<TrackerStore>>,
    pub telemetry: Arc<ScriptedTelemetry>,
    pub notifier: Arc<CapturingNotifier>,
    pub scheduler: Arc<MatchScheduler>,
}

pub fn create_test_system(pairs: usize) -> TestSystem {
    let store = Arc::new(RwLock::new(create_test_store(pairs)));
    let telemetry = Arc::new(ScriptedTelemetry::new());
    let notifier = Arc::new(CapturingNotifier::new());
    let scheduler = Arc::new(MatchScheduler::new(
        store.clone(),
        telemetry.clone(),
        ScoringPipeline::default(),
        notifier.clone(),
        settings(),
    ));

    TestSystem {
        store,
        telemetry,
        notifier,
        scheduler,
    }
}
