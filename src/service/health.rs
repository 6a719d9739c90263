//! Health checks and service statistics
//!
//! This module provides health check functionality for the duo-ladder
//! service, including readiness and liveness checks.

use crate::service::app::ServiceHandle;
use crate::store::StoreStats;
use crate::types::DuoPair;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Optional error message if not healthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Tracker statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub store: StoreStats,
    pub poll_interval_seconds: f64,
    pub cycle_running: bool,
    pub uptime_seconds: i64,
    /// Tracked pairs, best total first
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub duo_id: String,
    pub name: String,
    pub total_points: i64,
    pub wins: u32,
    pub losses: u32,
    pub streak: i32,
}

impl From<&DuoPair> for LeaderboardEntry {
    fn from(pair: &DuoPair) -> Self {
        Self {
            duo_id: pair.id.clone(),
            name: pair.name.clone(),
            total_points: pair.total_points,
            wins: pair.wins,
            losses: pair.losses,
            streak: pair.streak,
        }
    }
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(handle: &ServiceHandle) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(handle).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        let store_check = Self::check_store(handle);
        if store_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if store_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(store_check);

        let stats = Self::gather_service_stats(handle).await;

        Ok(HealthCheck {
            status: overall_status,
            service: handle.service_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(handle: &ServiceHandle) -> Result<HealthStatus> {
        if handle.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - running and the store is reachable
    pub async fn readiness_check(handle: &ServiceHandle) -> Result<HealthStatus> {
        if !handle.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }
        Ok(Self::check_store(handle).status)
    }

    async fn check_service_running(handle: &ServiceHandle) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if handle.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// The store is held for writing only while a match is applied
    fn check_store(handle: &ServiceHandle) -> ComponentCheck {
        let start = std::time::Instant::now();
        let store = handle.store();

        let (status, message) = match store.try_read() {
            Ok(store) if store.pair_count() == 0 => (
                HealthStatus::Degraded,
                Some("No pairs are tracked".to_string()),
            ),
            Ok(_) => (HealthStatus::Healthy, None),
            Err(_) => (
                HealthStatus::Degraded,
                Some("Store busy applying a match".to_string()),
            ),
        };

        ComponentCheck {
            name: "store".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn gather_service_stats(handle: &ServiceHandle) -> ServiceStats {
        let scheduler = handle.scheduler();
        let (store, mut leaderboard) = {
            let store = handle.store();
            let store = store.read().await;
            let entries: Vec<LeaderboardEntry> =
                store.tracked_pairs().iter().map(LeaderboardEntry::from).collect();
            (store.stats(), entries)
        };
        leaderboard.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.duo_id.cmp(&b.duo_id))
        });

        debug!("Gathered stats for {} pairs", leaderboard.len());

        ServiceStats {
            store,
            poll_interval_seconds: scheduler.current_interval().as_secs_f64(),
            cycle_running: scheduler.is_cycle_running(),
            uptime_seconds: (chrono::Utc::now() - handle.started_at()).num_seconds(),
            leaderboard,
        }
    }
}
