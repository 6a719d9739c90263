//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! duo-ladder service. Values start from defaults, are optionally replaced by
//! a TOML file, then overridden by environment variables and finally by
//! command-line flags in `main`.

use crate::config::scoring::ScoringConfig;
use crate::scheduler::{PollIntervalPolicy, SchedulerSettings};
use crate::telemetry::RiotClientConfig;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub riot: RiotSettings,
    pub tracking: TrackingSettings,
    pub scoring: ScoringConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health check endpoint
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Riot API access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiotSettings {
    pub api_key: String,
    /// Platform routing value, e.g. `euw1`
    pub platform: String,
    /// Regional routing value, e.g. `europe`
    pub region: String,
    pub request_timeout_seconds: u64,
    pub max_rate_limit_retries: u32,
    /// Wait after a 429 without a usable `Retry-After`
    pub default_retry_after_seconds: u64,
}

/// What to track and how often
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    /// Ranked queue id (420 = ranked solo/duo)
    pub queue_id: u16,
    /// Matches created before this instant are ignored
    pub event_start: Option<DateTime<Utc>>,
    /// History depth requested per player per cycle
    pub match_history_count: u32,
    /// Poll interval while no pairs are tracked
    pub base_poll_interval_seconds: u64,
    /// Roster file loaded into the store at startup
    pub roster_path: Option<PathBuf>,
    /// Buffered scored-match events per subscriber
    pub event_channel_capacity: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "duo-ladder".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for RiotSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            platform: "euw1".to_string(),
            region: "europe".to_string(),
            request_timeout_seconds: 10,
            max_rate_limit_retries: 3,
            default_retry_after_seconds: 2,
        }
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            queue_id: 420,
            event_start: None,
            match_history_count: 20,
            base_poll_interval_seconds: 60,
            roster_path: None,
            event_channel_capacity: 256,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_overrides(|key| env::var(key).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Apply `KEY=value` overrides from any source (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Service settings
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Some(port) = lookup("HEALTH_PORT") {
            self.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Some(timeout) = lookup("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Riot settings
        if let Some(api_key) = lookup("RIOT_API_KEY") {
            self.riot.api_key = api_key;
        }
        if let Some(platform) = lookup("RIOT_PLATFORM") {
            self.riot.platform = platform;
        }
        if let Some(region) = lookup("RIOT_REGION") {
            self.riot.region = region;
        }
        if let Some(timeout) = lookup("RIOT_REQUEST_TIMEOUT_SECONDS") {
            self.riot.request_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid RIOT_REQUEST_TIMEOUT_SECONDS value: {}", timeout))?;
        }
        if let Some(retries) = lookup("RIOT_MAX_RATE_LIMIT_RETRIES") {
            self.riot.max_rate_limit_retries = retries
                .parse()
                .map_err(|_| anyhow!("Invalid RIOT_MAX_RATE_LIMIT_RETRIES value: {}", retries))?;
        }

        // Tracking settings
        if let Some(queue_id) = lookup("TRACKED_QUEUE_ID") {
            self.tracking.queue_id = queue_id
                .parse()
                .map_err(|_| anyhow!("Invalid TRACKED_QUEUE_ID value: {}", queue_id))?;
        }
        if let Some(event_start) = lookup("EVENT_START") {
            self.tracking.event_start = Some(parse_event_start(&event_start)?);
        }
        if let Some(count) = lookup("MATCH_HISTORY_COUNT") {
            self.tracking.match_history_count = count
                .parse()
                .map_err(|_| anyhow!("Invalid MATCH_HISTORY_COUNT value: {}", count))?;
        }
        if let Some(interval) = lookup("BASE_POLL_INTERVAL_SECONDS") {
            self.tracking.base_poll_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid BASE_POLL_INTERVAL_SECONDS value: {}", interval))?;
        }
        if let Some(path) = lookup("ROSTER_PATH") {
            self.tracking.roster_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    pub fn base_poll_interval(&self) -> Duration {
        Duration::from_secs(self.tracking.base_poll_interval_seconds)
    }

    pub fn riot_client_config(&self) -> RiotClientConfig {
        let mut client = RiotClientConfig::for_routing(
            self.riot.api_key.clone(),
            &self.riot.platform,
            &self.riot.region,
        );
        client.request_timeout = Duration::from_secs(self.riot.request_timeout_seconds);
        client.max_rate_limit_retries = self.riot.max_rate_limit_retries;
        client.default_retry_after = Duration::from_secs(self.riot.default_retry_after_seconds);
        client
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            queue_id: self.tracking.queue_id,
            event_start: self.tracking.event_start,
            match_history_count: self.tracking.match_history_count,
            policy: PollIntervalPolicy::with_base_interval(self.base_poll_interval()),
        }
    }
}

/// RFC 3339 timestamp (`2024-06-01T00:00:00Z`) or a bare date taken as midnight UTC
pub fn parse_event_start(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| anyhow!("Invalid EVENT_START value: {}", value))
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate Riot settings
    if config.riot.platform.trim().is_empty() {
        return Err(anyhow!("Riot platform cannot be empty"));
    }
    if config.riot.region.trim().is_empty() {
        return Err(anyhow!("Riot region cannot be empty"));
    }
    if config.riot.request_timeout_seconds == 0 {
        return Err(anyhow!("Riot request timeout must be greater than 0"));
    }

    // Validate tracking settings
    if !(1..=100).contains(&config.tracking.match_history_count) {
        return Err(anyhow!(
            "Match history count must be between 1 and 100, got {}",
            config.tracking.match_history_count
        ));
    }
    if config.tracking.base_poll_interval_seconds == 0 {
        return Err(anyhow!("Base poll interval must be greater than 0"));
    }
    if config.tracking.event_channel_capacity == 0 {
        return Err(anyhow!("Event channel capacity must be greater than 0"));
    }

    config.scoring.validate()?;
    Ok(())
}
