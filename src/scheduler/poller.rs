//! Poll loop that discovers and scores duo matches
//!
//! One spawned task drives [`MatchScheduler::run_cycle`] from a timer. Pairs
//! are processed one at a time and every store mutation happens from this
//! task, so the store's match table is a dedup barrier: a match id is
//! inserted before it is scored, and an id already present is skipped.
//!
//! Current ranks are looked up at most once per pair per cycle. When one
//! cycle scores several matches for a pair, all of them record that
//! post-cycle rank as `rank_after`, and every match after the first uses it
//! as `rank_before`; ranks between those matches are not observable.
//!
//! A shared id whose details are missing or undecodable is rejected like a
//! failed filter so it cannot block newer matches. Transient failures skip
//! the pair for this cycle only.

use crate::error::{Result, TelemetryError};
use crate::metrics::MetricsCollector;
use crate::notify::{MatchScoredEvent, ScoreNotifier};
use crate::rank::RankInfo;
use crate::scheduler::discovery::{
    evaluate_candidate, match_record, player_game_stats, shared_match_ids, DiscoveryFilter,
};
use crate::scheduler::interval::PollIntervalPolicy;
use crate::scoring::ScoringPipeline;
use crate::store::TrackerStore;
use crate::telemetry::MatchTelemetry;
use crate::types::{MatchRecord, PlayerRecord};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Settings the scheduler consumes but does not own
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerSettings {
    /// Ranked queue to track (420 = ranked solo/duo)
    pub queue_id: u16,
    /// Matches created before this are ignored
    pub event_start: Option<DateTime<Utc>>,
    /// History depth requested per player per cycle
    pub match_history_count: u32,
    pub policy: PollIntervalPolicy,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            queue_id: 420,
            event_start: None,
            match_history_count: 20,
            policy: PollIntervalPolicy::default(),
        }
    }
}

impl SchedulerSettings {
    fn filter(&self) -> DiscoveryFilter {
        DiscoveryFilter {
            queue_id: self.queue_id,
            event_start: self.event_start,
        }
    }
}

/// Summary of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Another cycle was still running; nothing was done
    pub skipped: bool,
    pub pairs_polled: usize,
    pub pairs_failed: usize,
    pub matches_scored: usize,
    pub matches_rejected: usize,
    pub duration_ms: u64,
}

impl CycleReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    fn outcome(&self) -> &'static str {
        if self.skipped {
            "skipped"
        } else if self.pairs_failed > 0 {
            "partial"
        } else {
            "completed"
        }
    }
}

#[derive(Debug, Default)]
struct PairOutcome {
    scored: usize,
    rejected: usize,
}

/// Clears the re-entrancy flag when a cycle ends, including on panic
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MatchScheduler {
    store: Arc<RwLock<TrackerStore>>,
    telemetry: Arc<dyn MatchTelemetry>,
    pipeline: ScoringPipeline,
    notifier: Arc<dyn ScoreNotifier>,
    metrics: Option<Arc<MetricsCollector>>,
    settings: SchedulerSettings,
    cycle_running: AtomicBool,
    interval_ms: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
}

impl MatchScheduler {
    pub fn new(
        store: Arc<RwLock<TrackerStore>>,
        telemetry: Arc<dyn MatchTelemetry>,
        pipeline: ScoringPipeline,
        notifier: Arc<dyn ScoreNotifier>,
        settings: SchedulerSettings,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            store,
            telemetry,
            pipeline,
            notifier,
            metrics: None,
            interval_ms: AtomicU64::new(settings.policy.base_interval.as_millis() as u64),
            settings,
            cycle_running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Interval the timer is currently running at
    pub fn current_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Acquire))
    }

    pub fn is_cycle_running(&self) -> bool {
        self.cycle_running.load(Ordering::Acquire)
    }

    /// Ideal interval for the pairs tracked right now
    pub async fn ideal_interval(&self) -> Duration {
        let pairs = self.store.read().await.pair_count();
        self.settings.policy.ideal_interval(pairs)
    }

    /// Poll every tracked pair once.
    ///
    /// Returns a skipped report without touching anything if a cycle is
    /// already in flight.
    pub async fn run_cycle(&self) -> CycleReport {
        if self
            .cycle_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Poll cycle still running, skipping tick");
            if let Some(metrics) = &self.metrics {
                metrics.record_cycle("skipped", Duration::ZERO);
            }
            return CycleReport::skipped();
        }
        let _guard = CycleGuard(&self.cycle_running);

        let started = Instant::now();
        let pairs = self.store.read().await.tracked_pairs();
        if let Some(metrics) = &self.metrics {
            metrics.set_tracked_pairs(pairs.len());
        }

        let mut report = CycleReport::default();
        for pair in &pairs {
            report.pairs_polled += 1;
            match self.process_pair(&pair.id).await {
                Ok(outcome) => {
                    report.matches_scored += outcome.scored;
                    report.matches_rejected += outcome.rejected;
                }
                Err(e) => {
                    report.pairs_failed += 1;
                    warn!("Skipping pair '{}' this cycle: {:#}", pair.id, e);
                    if let Some(metrics) = &self.metrics {
                        metrics.record_pair_failure();
                    }
                }
            }
        }

        let elapsed = started.elapsed();
        report.duration_ms = elapsed.as_millis() as u64;
        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(report.outcome(), elapsed);
        }

        debug!(
            "Poll cycle finished - pairs: {}, failed: {}, scored: {}, rejected: {}, time: {}ms",
            report.pairs_polled,
            report.pairs_failed,
            report.matches_scored,
            report.matches_rejected,
            report.duration_ms
        );
        report
    }

    async fn process_pair(&self, duo_id: &str) -> Result<PairOutcome> {
        let (_, noob, carry) = self.store.read().await.pair_members(duo_id)?;
        let count = self.settings.match_history_count;
        let queue_id = self.settings.queue_id;
        let event_start = self.settings.event_start;

        let noob_ids = self
            .telemetry
            .recent_match_ids(&noob.puuid, count, queue_id, event_start)
            .await
            .map_err(|e| self.telemetry_failure(e))?;
        let carry_ids = self
            .telemetry
            .recent_match_ids(&carry.puuid, count, queue_id, event_start)
            .await
            .map_err(|e| self.telemetry_failure(e))?;

        let mut outcome = PairOutcome::default();
        // (noob, carry) current ranks, fetched once per pair when first needed
        let mut current_ranks: Option<(Option<RankInfo>, Option<RankInfo>)> = None;

        for match_id in shared_match_ids(&noob_ids, &carry_ids) {
            if self.store.read().await.is_known_match(&match_id) {
                continue;
            }

            let details = match self.telemetry.match_details(&match_id).await {
                Ok(details) => details,
                Err(e) if e.is_transient() => return Err(self.telemetry_failure(e)),
                Err(e) if e.is_unusable_match() => {
                    // a missing or malformed match never becomes valid
                    warn!("Rejected match {} for '{}': {}", match_id, duo_id, e);
                    self.store.write().await.reject_match(match_id.clone());
                    if let Some(metrics) = &self.metrics {
                        metrics.record_telemetry_error(&e);
                        metrics.record_rejection("unusable_details");
                    }
                    outcome.rejected += 1;
                    continue;
                }
                Err(e) => return Err(self.telemetry_failure(e)),
            };

            // re-read so streaks and ranks include matches scored earlier in this loop
            let (pair, noob, carry) = self.store.read().await.pair_members(duo_id)?;

            let candidate =
                match evaluate_candidate(&details, &self.settings.filter(), &noob, &carry) {
                    Ok(candidate) => candidate,
                    Err(rejection) => {
                        debug!("Rejected match {} for '{}': {}", match_id, duo_id, rejection);
                        self.store.write().await.reject_match(match_id.clone());
                        if let Some(metrics) = &self.metrics {
                            metrics.record_rejection(rejection.as_str());
                        }
                        outcome.rejected += 1;
                        continue;
                    }
                };

            let (noob_rank, carry_rank) = match current_ranks {
                Some(ranks) => ranks,
                None => {
                    let ranks = (self.current_rank(&noob).await, self.current_rank(&carry).await);
                    current_ranks = Some(ranks);
                    ranks
                }
            };

            let record = match_record(
                &pair.id,
                &candidate,
                player_game_stats(&noob, candidate.noob, noob_rank.unwrap_or(noob.rank)),
                player_game_stats(&carry, candidate.carry, carry_rank.unwrap_or(carry.rank)),
                current_timestamp(),
            );

            if self.score_and_apply(record, &noob, &carry).await? {
                outcome.scored += 1;
            }
        }

        Ok(outcome)
    }

    /// Insert, score and apply one match. Returns false if the id was already stored.
    async fn score_and_apply(
        &self,
        record: MatchRecord,
        noob: &PlayerRecord,
        carry: &PlayerRecord,
    ) -> Result<bool> {
        let result = {
            let mut store = self.store.write().await;
            if !store.insert_match(record.clone()) {
                debug!("Match {} already stored, not scoring again", record.match_id);
                return Ok(false);
            }

            let result = self.pipeline.score(&record, noob.streak, carry.streak);
            store.mark_scored(&record.match_id, result.total)?;
            store.apply_score(&record, &result)?;
            result
        };

        info!(
            "Scored match {} for '{}': total {:+} ({} alerts)",
            record.match_id,
            record.duo_id,
            result.total,
            result.alerts.len()
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_match_scored(record.win, &result);
        }

        let event = MatchScoredEvent::new(&record, &result);
        if let Err(e) = self.notifier.publish_match_scored(event).await {
            warn!("Failed to publish match {}: {}", record.match_id, e);
        }

        Ok(true)
    }

    async fn current_rank(&self, player: &PlayerRecord) -> Option<RankInfo> {
        match self.telemetry.rank_by_summoner_id(&player.summoner_id).await {
            Ok(Some(rank)) => Some(rank),
            Ok(None) => {
                debug!("'{}' is unranked, keeping stored rank", player.id);
                None
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_telemetry_error(&e);
                }
                warn!(
                    "Rank lookup failed for '{}', keeping stored rank: {}",
                    player.id, e
                );
                None
            }
        }
    }

    fn telemetry_failure(&self, error: TelemetryError) -> anyhow::Error {
        if let Some(metrics) = &self.metrics {
            metrics.record_telemetry_error(&error);
        }
        error.into()
    }

    /// Spawn the poll loop. The first cycle runs immediately.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        self.shutdown_tx.send_replace(false);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let scheduler = Arc::clone(self);

        tokio::spawn(async move {
            let mut period = scheduler.ideal_interval().await;
            scheduler.store_interval(period);
            let mut ticker = poll_timer(period, true);

            info!("Match scheduler started ({}s interval)", period.as_secs_f64());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let report = scheduler.run_cycle().await;
                if report.pairs_failed > 0 {
                    warn!(
                        "Poll cycle completed with {} failed pairs",
                        report.pairs_failed
                    );
                }

                let ideal = scheduler.ideal_interval().await;
                if scheduler.settings.policy.should_reschedule(period, ideal) {
                    info!(
                        "Rescheduling poll timer: {}s -> {}s",
                        period.as_secs_f64(),
                        ideal.as_secs_f64()
                    );
                    period = ideal;
                    scheduler.store_interval(period);
                    if let Some(metrics) = &scheduler.metrics {
                        metrics.record_reschedule(period);
                    }
                    ticker = poll_timer(period, false);
                }
            }

            info!("Match scheduler stopped");
        })
    }

    /// Signal the poll loop to stop; an in-flight cycle completes first
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    fn store_interval(&self, period: Duration) {
        self.interval_ms
            .store(period.as_millis() as u64, Ordering::Release);
        if let Some(metrics) = &self.metrics {
            metrics.set_poll_interval(period);
        }
    }
}

fn poll_timer(period: Duration, immediate: bool) -> Interval {
    let start = if immediate {
        tokio::time::Instant::now()
    } else {
        tokio::time::Instant::now() + period
    };
    let mut timer = interval_at(start, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}
