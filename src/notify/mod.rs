//! Scored-match events for presentation collaborators
//!
//! The scheduler publishes one [`MatchScoredEvent`] per scored match through
//! the [`ScoreNotifier`] trait. Publishing failures are logged by the caller
//! and never affect stored state.

use crate::error::Result;
use crate::rank::RankInfo;
use crate::scoring::{Alert, ScoreResult};
use crate::types::{DuoId, MatchId, MatchRecord};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Everything a chat or leaderboard surface needs to announce a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScoredEvent {
    pub match_id: MatchId,
    pub duo_id: DuoId,
    pub win: bool,
    pub noob_final: i32,
    pub carry_final: i32,
    pub total: i32,
    pub alerts: Vec<Alert>,
    pub noob_rank: RankInfo,
    pub carry_rank: RankInfo,
    pub is_remake_or_early_game: bool,
    pub scored_at: DateTime<Utc>,
}

impl MatchScoredEvent {
    pub fn new(record: &MatchRecord, result: &ScoreResult) -> Self {
        Self {
            match_id: record.match_id.clone(),
            duo_id: record.duo_id.clone(),
            win: record.win,
            noob_final: result.noob.final_points(),
            carry_final: result.carry.final_points(),
            total: result.total,
            alerts: result.alerts.clone(),
            noob_rank: record.noob.rank_after,
            carry_rank: record.carry.rank_after,
            is_remake_or_early_game: result.is_remake_or_early_game,
            scored_at: current_timestamp(),
        }
    }
}

/// Sink for scored-match events
#[async_trait]
pub trait ScoreNotifier: Send + Sync {
    async fn publish_match_scored(&self, event: MatchScoredEvent) -> Result<()>;
}

/// In-process fan-out over a tokio broadcast channel
///
/// Slow subscribers lag and lose the oldest events; the scheduler never waits.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<MatchScoredEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchScoredEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl ScoreNotifier for BroadcastNotifier {
    async fn publish_match_scored(&self, event: MatchScoredEvent) -> Result<()> {
        let match_id = event.match_id.clone();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Match {} delivered to {} subscribers", match_id, receivers),
            Err(_) => debug!("Match {} scored with no subscribers listening", match_id),
        }
        Ok(())
    }
}

/// Writes each scored match to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl ScoreNotifier for LogNotifier {
    async fn publish_match_scored(&self, event: MatchScoredEvent) -> Result<()> {
        if event.is_remake_or_early_game {
            info!(
                "Duo '{}' match {} voided (remake or early end)",
                event.duo_id, event.match_id
            );
            return Ok(());
        }

        let alerts: Vec<String> = event
            .alerts
            .iter()
            .map(|alert| match alert.player {
                Some(slot) => format!("{}:{}", alert.kind, slot),
                None => alert.kind.to_string(),
            })
            .collect();

        info!(
            "Duo '{}' {} match {}: noob {:+}, carry {:+}, total {:+} [{}]",
            event.duo_id,
            if event.win { "won" } else { "lost" },
            event.match_id,
            event.noob_final,
            event.carry_final,
            event.total,
            alerts.join(", ")
        );
        Ok(())
    }
}

/// Publishes to several notifiers; one failing does not stop the others
pub struct FanoutNotifier {
    notifiers: Vec<Arc<dyn ScoreNotifier>>,
}

impl FanoutNotifier {
    pub fn new(notifiers: Vec<Arc<dyn ScoreNotifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl ScoreNotifier for FanoutNotifier {
    async fn publish_match_scored(&self, event: MatchScoredEvent) -> Result<()> {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.publish_match_scored(event.clone()).await {
                warn!("Notifier failed for match {}: {}", event.match_id, e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::{Division, Tier};
    use crate::scoring::ScoringPipeline;
    use crate::types::PlayerGameStats;

    fn stats(player_id: &str) -> PlayerGameStats {
        PlayerGameStats {
            player_id: player_id.to_string(),
            champion_name: "Lux".to_string(),
            kills: 4,
            deaths: 3,
            assists: 9,
            team_id: 100,
            off_role: false,
            off_champion: false,
            double_kills: None,
            triple_kills: None,
            quadra_kills: None,
            penta_kills: None,
            first_blood: None,
            rank_before: RankInfo::divided(Tier::Silver, Division::I),
            rank_after: RankInfo::divided(Tier::Gold, Division::IV),
        }
    }

    fn record() -> MatchRecord {
        MatchRecord {
            match_id: "EUW1_42".to_string(),
            duo_id: "duo-1".to_string(),
            win: true,
            remake: false,
            surrender: false,
            duration_secs: 1900,
            game_creation: current_timestamp(),
            noob: stats("n"),
            carry: stats("c"),
            scored: false,
            points_awarded: 0,
            discovered_at: current_timestamp(),
        }
    }

    #[test]
    fn test_event_from_result() {
        let record = record();
        let result = ScoringPipeline::default().score(&record, 0, 0);
        let event = MatchScoredEvent::new(&record, &result);

        assert_eq!(event.match_id, "EUW1_42");
        assert_eq!(event.total, result.total);
        assert_eq!(event.noob_final, result.noob.final_points());
        assert_eq!(event.noob_rank, RankInfo::divided(Tier::Gold, Division::IV));
        assert!(!event.is_remake_or_early_game);
    }

    #[tokio::test]
    async fn test_broadcast_delivers_to_subscribers() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        let record = record();
        let result = ScoringPipeline::default().score(&record, 0, 0);
        notifier
            .publish_match_scored(MatchScoredEvent::new(&record, &result))
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.match_id, "EUW1_42");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_ok() {
        let notifier = BroadcastNotifier::new(8);
        let record = record();
        let result = ScoringPipeline::default().score(&record, 0, 0);

        assert!(notifier
            .publish_match_scored(MatchScoredEvent::new(&record, &result))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_notifier() {
        let broadcast = Arc::new(BroadcastNotifier::new(4));
        let mut rx = broadcast.subscribe();
        let notifiers: Vec<Arc<dyn ScoreNotifier>> = vec![Arc::new(LogNotifier), broadcast.clone()];
        let fanout = FanoutNotifier::new(notifiers);

        let record = record();
        let result = ScoringPipeline::default().score(&record, 0, 0);
        fanout
            .publish_match_scored(MatchScoredEvent::new(&record, &result))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().duo_id, "duo-1");
    }
}
