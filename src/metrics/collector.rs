//! Metrics collection using Prometheus
//!
//! This module provides metrics for the poll scheduler, the telemetry client
//! and the scoring pipeline of the duo-ladder service.

use crate::error::TelemetryError;
use crate::scoring::ScoreResult;
use anyhow::Result;
use prometheus::{
    Gauge, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the tracker service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Poll scheduler metrics
    scheduler_metrics: SchedulerMetrics,

    /// Scoring metrics
    scoring_metrics: ScoringMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Poll scheduler metrics
#[derive(Clone)]
pub struct SchedulerMetrics {
    /// Poll cycles by outcome (completed, partial, skipped)
    pub cycles_total: IntCounterVec,

    /// Wall time of one poll cycle
    pub cycle_duration: Histogram,

    /// Current poll interval
    pub poll_interval_seconds: Gauge,

    /// Timer recreations after a pair-count change
    pub reschedules_total: IntCounter,

    /// Pairs currently tracked
    pub tracked_pairs: IntGauge,

    /// Pairs skipped for a cycle after a telemetry failure
    pub pair_failures_total: IntCounter,

    /// Telemetry errors surfaced to the scheduler, by kind
    pub telemetry_errors_total: IntCounterVec,
}

/// Scoring metrics
#[derive(Clone)]
pub struct ScoringMetrics {
    /// Matches scored by result (win, loss, void)
    pub matches_scored_total: IntCounterVec,

    /// Rejected candidates by reason
    pub candidates_rejected_total: IntCounterVec,

    /// Final points by recipient (noob, carry, pair)
    pub points_awarded: HistogramVec,

    /// Alerts raised by type
    pub alerts_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let scheduler_metrics = SchedulerMetrics::new(&registry)?;
        let scoring_metrics = ScoringMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            scheduler_metrics,
            scoring_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    pub fn scheduler(&self) -> &SchedulerMetrics {
        &self.scheduler_metrics
    }

    pub fn scoring(&self) -> &ScoringMetrics {
        &self.scoring_metrics
    }

    /// Record the end of a poll cycle
    pub fn record_cycle(&self, outcome: &str, duration: Duration) {
        self.scheduler_metrics
            .cycles_total
            .with_label_values(&[outcome])
            .inc();
        self.scheduler_metrics
            .cycle_duration
            .observe(duration.as_secs_f64());
    }

    pub fn set_poll_interval(&self, interval: Duration) {
        self.scheduler_metrics
            .poll_interval_seconds
            .set(interval.as_secs_f64());
    }

    pub fn record_reschedule(&self, interval: Duration) {
        self.scheduler_metrics.reschedules_total.inc();
        self.set_poll_interval(interval);
    }

    pub fn set_tracked_pairs(&self, pairs: usize) {
        self.scheduler_metrics.tracked_pairs.set(pairs as i64);
    }

    pub fn record_pair_failure(&self) {
        self.scheduler_metrics.pair_failures_total.inc();
    }

    pub fn record_telemetry_error(&self, error: &TelemetryError) {
        let kind = match error {
            TelemetryError::RateLimited { .. } => "rate_limited",
            TelemetryError::NotFound { .. } => "not_found",
            TelemetryError::Status { .. } => "status",
            TelemetryError::Transport { .. } => "transport",
            TelemetryError::Decode { .. } => "decode",
        };
        self.scheduler_metrics
            .telemetry_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn record_rejection(&self, reason: &str) {
        self.scoring_metrics
            .candidates_rejected_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a scored match with its point breakdown and alerts
    pub fn record_match_scored(&self, win: bool, result: &ScoreResult) {
        let outcome = if result.is_remake_or_early_game {
            "void"
        } else if win {
            "win"
        } else {
            "loss"
        };

        self.scoring_metrics
            .matches_scored_total
            .with_label_values(&[outcome])
            .inc();

        if !result.is_remake_or_early_game {
            let points = &self.scoring_metrics.points_awarded;
            points
                .with_label_values(&["noob"])
                .observe(f64::from(result.noob.final_points()));
            points
                .with_label_values(&["carry"])
                .observe(f64::from(result.carry.final_points()));
            points
                .with_label_values(&["pair"])
                .observe(f64::from(result.total));
        }

        for alert in &result.alerts {
            self.scoring_metrics
                .alerts_total
                .with_label_values(&[alert.kind.as_str()])
                .inc();
        }
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("duo_ladder_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "duo_ladder_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("duo_ladder_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl SchedulerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let cycles_total = IntCounterVec::new(
            Opts::new("duo_ladder_poll_cycles_total", "Poll cycles by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(cycles_total.clone()))?;

        let cycle_duration = Histogram::with_opts(
            HistogramOpts::new(
                "duo_ladder_poll_cycle_duration_seconds",
                "Poll cycle duration",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )?;
        registry.register(Box::new(cycle_duration.clone()))?;

        let poll_interval_seconds = Gauge::new(
            "duo_ladder_poll_interval_seconds",
            "Current poll interval in seconds",
        )?;
        registry.register(Box::new(poll_interval_seconds.clone()))?;

        let reschedules_total = IntCounter::new(
            "duo_ladder_poll_reschedules_total",
            "Poll timer recreations",
        )?;
        registry.register(Box::new(reschedules_total.clone()))?;

        let tracked_pairs = IntGauge::new("duo_ladder_tracked_pairs", "Tracked duo pairs")?;
        registry.register(Box::new(tracked_pairs.clone()))?;

        let pair_failures_total = IntCounter::new(
            "duo_ladder_pair_failures_total",
            "Pairs skipped for a cycle after a telemetry failure",
        )?;
        registry.register(Box::new(pair_failures_total.clone()))?;

        let telemetry_errors_total = IntCounterVec::new(
            Opts::new(
                "duo_ladder_telemetry_errors_total",
                "Telemetry errors by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(telemetry_errors_total.clone()))?;

        Ok(Self {
            cycles_total,
            cycle_duration,
            poll_interval_seconds,
            reschedules_total,
            tracked_pairs,
            pair_failures_total,
            telemetry_errors_total,
        })
    }
}

impl ScoringMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_scored_total = IntCounterVec::new(
            Opts::new("duo_ladder_matches_scored_total", "Matches scored"),
            &["result"],
        )?;
        registry.register(Box::new(matches_scored_total.clone()))?;

        let candidates_rejected_total = IntCounterVec::new(
            Opts::new(
                "duo_ladder_candidates_rejected_total",
                "Shared matches rejected by the discovery filters",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(candidates_rejected_total.clone()))?;

        let points_awarded = HistogramVec::new(
            HistogramOpts::new("duo_ladder_points_awarded", "Final points per match")
                .buckets(vec![
                    -70.0, -40.0, -20.0, -10.0, 0.0, 10.0, 20.0, 40.0, 60.0, 90.0, 120.0,
                ]),
            &["recipient"],
        )?;
        registry.register(Box::new(points_awarded.clone()))?;

        let alerts_total = IntCounterVec::new(
            Opts::new("duo_ladder_alerts_total", "Alerts raised by type"),
            &["type"],
        )?;
        registry.register(Box::new(alerts_total.clone()))?;

        Ok(Self {
            matches_scored_total,
            candidates_rejected_total,
            points_awarded,
            alerts_total,
        })
    }
}
