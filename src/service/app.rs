//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the store, the
//! Riot telemetry client, the match scheduler, notifiers and the metrics
//! server together, and owns their background tasks.

use crate::config::{AppConfig, Roster};
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector, MetricsService};
use crate::notify::{
    BroadcastNotifier, FanoutNotifier, LogNotifier, MatchScoredEvent, ScoreNotifier,
};
use crate::scheduler::MatchScheduler;
use crate::scoring::ScoringPipeline;
use crate::store::{StoreStats, TrackerStore};
use crate::telemetry::{MatchTelemetry, RiotTelemetryClient};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Shared handles the health endpoints inspect
#[derive(Clone)]
pub struct ServiceHandle {
    service_name: String,
    store: Arc<RwLock<TrackerStore>>,
    scheduler: Arc<MatchScheduler>,
    is_running: Arc<RwLock<bool>>,
    started_at: DateTime<Utc>,
}

impl ServiceHandle {
    pub fn new(
        service_name: impl Into<String>,
        store: Arc<RwLock<TrackerStore>>,
        scheduler: Arc<MatchScheduler>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            store,
            scheduler,
            is_running: Arc::new(RwLock::new(false)),
            started_at: current_timestamp(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn store(&self) -> Arc<RwLock<TrackerStore>> {
        self.store.clone()
    }

    pub fn scheduler(&self) -> Arc<MatchScheduler> {
        self.scheduler.clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub async fn set_running(&self, running: bool) {
        *self.is_running.write().await = running;
    }
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Store, scheduler and running flag shared with the health endpoints
    handle: ServiceHandle,

    /// In-process feed of scored matches
    events: Arc<BroadcastNotifier>,

    /// Metrics service for monitoring and health checks
    metrics_service: Arc<MetricsService>,

    /// Poll loop task
    scheduler_task: Option<JoinHandle<()>>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,
}

impl AppState {
    /// Initialize the application against the Riot API
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        if config.riot.api_key.trim().is_empty() {
            return Err(ServiceError::Configuration {
                message: "RIOT_API_KEY is required".to_string(),
            });
        }

        let client = RiotTelemetryClient::new(config.riot_client_config()).map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create Riot client: {}", e),
            }
        })?;

        info!(
            "Riot client ready - platform: {}, region: {}",
            config.riot.platform, config.riot.region
        );

        Self::with_telemetry(config, Arc::new(client))
    }

    /// Initialize the application with any telemetry source
    pub fn with_telemetry(
        config: AppConfig,
        telemetry: Arc<dyn MatchTelemetry>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing duo-ladder service");
        info!(
            "Configuration: service={}, queue={}, event_start={:?}",
            config.service.name, config.tracking.queue_id, config.tracking.event_start
        );

        let store = Arc::new(RwLock::new(Self::load_store(&config)?));
        let metrics_collector = Self::initialize_metrics()?;

        let pipeline = ScoringPipeline::new(config.scoring.clone()).map_err(|e| {
            ServiceError::Configuration {
                message: format!("Invalid scoring configuration: {}", e),
            }
        })?;

        let events = Arc::new(BroadcastNotifier::new(
            config.tracking.event_channel_capacity,
        ));
        let notifiers: Vec<Arc<dyn ScoreNotifier>> = vec![Arc::new(LogNotifier), events.clone()];
        let notifier = Arc::new(FanoutNotifier::new(notifiers));

        let scheduler = Arc::new(
            MatchScheduler::new(
                store.clone(),
                telemetry,
                pipeline,
                notifier,
                config.scheduler_settings(),
            )
            .with_metrics(metrics_collector.clone()),
        );

        let handle = ServiceHandle::new(config.service.name.clone(), store, scheduler);

        let health_config = HealthServerConfig {
            port: config.service.health_port,
            host: "0.0.0.0".to_string(),
        };
        let health_server = Arc::new(
            HealthServer::new(health_config, metrics_collector.clone()).with_service(handle.clone()),
        );
        let metrics_service = Arc::new(MetricsService::new(metrics_collector, health_server));

        Ok(Self {
            config,
            handle,
            events,
            metrics_service,
            scheduler_task: None,
            background_tasks: Vec::new(),
        })
    }

    /// Build the store from the configured roster (empty without one)
    pub fn load_store(config: &AppConfig) -> Result<TrackerStore, ServiceError> {
        let mut store = TrackerStore::new();

        match &config.tracking.roster_path {
            Some(path) => {
                info!("Loading roster from {}", path.display());
                let roster = Roster::from_file(path).map_err(|e| ServiceError::Configuration {
                    message: format!("{:#}", e),
                })?;
                roster
                    .apply_to(&mut store)
                    .map_err(|e| ServiceError::Configuration {
                        message: format!("Roster rejected: {:#}", e),
                    })?;
            }
            None => warn!("No roster configured - no pairs will be tracked"),
        }

        Ok(store)
    }

    /// Start all background services and the poll loop
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting duo-ladder service");

        self.handle.set_running(true).await;

        self.start_metrics_service().await?;

        self.scheduler_task = Some(self.handle.scheduler.start());
        info!("✅ Match scheduler started");

        self.start_background_tasks();

        info!("✅ Duo-ladder service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of duo-ladder service");

        self.handle.set_running(false).await;

        // Let an in-flight poll cycle finish
        self.handle.scheduler.stop();
        if let Some(task) = self.scheduler_task.take() {
            match tokio::time::timeout(self.config.shutdown_timeout(), task).await {
                Ok(Ok(())) => info!("✅ Match scheduler stopped"),
                Ok(Err(e)) => warn!("Match scheduler task failed: {}", e),
                Err(_) => warn!(
                    "Match scheduler did not stop within {}s",
                    self.config.shutdown_timeout().as_secs()
                ),
            }
        }

        self.stop_background_tasks().await;

        info!("Stopping metrics service...");
        if let Err(e) = self.metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        } else {
            info!("✅ Metrics service stopped");
        }

        let final_stats = self.store_stats().await;
        info!("Final tracker statistics: {:?}", final_stats);
        info!("✅ Duo-ladder service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        self.handle.is_running().await
    }

    pub fn store(&self) -> Arc<RwLock<TrackerStore>> {
        self.handle.store()
    }

    pub fn scheduler(&self) -> Arc<MatchScheduler> {
        self.handle.scheduler()
    }

    /// Subscribe to scored-match events
    pub fn subscribe(&self) -> broadcast::Receiver<MatchScoredEvent> {
        self.events.subscribe()
    }

    /// Get metrics service
    pub fn metrics_service(&self) -> Arc<MetricsService> {
        self.metrics_service.clone()
    }

    pub async fn store_stats(&self) -> StoreStats {
        self.handle.store.read().await.stats()
    }

    fn initialize_metrics() -> Result<Arc<MetricsCollector>, ServiceError> {
        let collector = MetricsCollector::new().map_err(|e| ServiceError::Initialization {
            message: format!("Failed to create metrics collector: {}", e),
        })?;
        Ok(Arc::new(collector))
    }

    /// Start metrics service
    async fn start_metrics_service(&mut self) -> Result<(), ServiceError> {
        info!("Starting metrics and health endpoints");

        let metrics_service = self.metrics_service.clone();
        let port = self.config.service.health_port;

        let metrics_handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {}", e);
            } else {
                info!("Metrics service task completed");
            }
        });

        self.background_tasks.push(metrics_handle);

        // Give the server a moment to start up
        tokio::time::sleep(Duration::from_millis(100)).await;

        info!("✅ Metrics service started on port {}", port);
        Ok(())
    }

    /// Start background maintenance tasks
    fn start_background_tasks(&mut self) {
        info!("Starting health metrics task (60s interval)...");

        let health_metrics_task = {
            let metrics_collector = self.metrics_service.collector();
            let handle = self.handle.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                let start_time = tokio::time::Instant::now();
                info!("Health metrics task started");

                while handle.is_running().await {
                    interval.tick().await;

                    let uptime_seconds = start_time.elapsed().as_secs() as i64;
                    metrics_collector
                        .service()
                        .uptime_seconds
                        .set(uptime_seconds);

                    let store_ok = handle.store.try_read().is_ok();
                    metrics_collector.update_component_health("store", store_ok);
                    metrics_collector.update_component_health("scheduler", true);
                    metrics_collector.update_health_status(if store_ok { 2 } else { 1 });

                    debug!(
                        "Updated service health metrics - uptime: {}s",
                        uptime_seconds
                    );
                }

                info!("Health metrics task stopped");
            })
        };

        self.background_tasks.push(health_metrics_task);
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        for (i, task) in self.background_tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}
