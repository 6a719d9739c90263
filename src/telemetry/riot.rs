//! HTTP client for the Riot match-v5 and league-v4 APIs
//!
//! Rate limiting is handled here: a 429 response is retried after the
//! server's `Retry-After` delay (or a default) up to a bounded number of
//! attempts, after which the caller receives [`TelemetryError::RateLimited`].

use crate::error::TelemetryError;
use crate::rank::RankInfo;
use crate::telemetry::{MatchDetails, MatchTelemetry, ParticipantStats};
use crate::types::{MatchId, Role};
use crate::utils::timestamp_from_millis;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("duo-ladder/", env!("CARGO_PKG_VERSION"));
const RANKED_SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

/// Connection settings for the Riot APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotClientConfig {
    pub api_key: String,
    /// Platform host, e.g. `https://euw1.api.riotgames.com` (league-v4)
    pub platform_base_url: String,
    /// Regional routing host, e.g. `https://europe.api.riotgames.com` (match-v5)
    pub regional_base_url: String,
    pub request_timeout: Duration,
    pub max_rate_limit_retries: u32,
    /// Wait used when a 429 carries no usable `Retry-After`
    pub default_retry_after: Duration,
}

impl RiotClientConfig {
    /// Build the public API hosts for a platform (`euw1`) and region (`europe`)
    pub fn for_routing(api_key: impl Into<String>, platform: &str, region: &str) -> Self {
        Self {
            api_key: api_key.into(),
            platform_base_url: format!("https://{}.api.riotgames.com", platform.to_lowercase()),
            regional_base_url: format!("https://{}.api.riotgames.com", region.to_lowercase()),
            request_timeout: Duration::from_secs(10),
            max_rate_limit_retries: 3,
            default_retry_after: Duration::from_secs(2),
        }
    }
}

/// Riot API implementation of [`MatchTelemetry`]
pub struct RiotTelemetryClient {
    client: Client,
    config: RiotClientConfig,
}

impl RiotTelemetryClient {
    pub fn new(config: RiotClientConfig) -> crate::error::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RiotClientConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, TelemetryError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let response = self
                .client
                .get(url)
                .header("X-Riot-Token", &self.config.api_key)
                .query(query)
                .send()
                .await
                .map_err(|e| TelemetryError::Transport {
                    message: e.to_string(),
                })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempts > self.config.max_rate_limit_retries {
                    return Err(TelemetryError::RateLimited { attempts });
                }

                let wait = parse_retry_after(response.headers())
                    .unwrap_or(self.config.default_retry_after);
                warn!(
                    "Rate limited on {} (attempt {}), retrying in {:?}",
                    endpoint, attempts, wait
                );
                sleep(wait).await;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(TelemetryError::NotFound {
                    resource: url.to_string(),
                });
            }

            if !status.is_success() {
                return Err(TelemetryError::Status {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                });
            }

            debug!("{} responded {} after {} attempt(s)", endpoint, status, attempts);

            return response
                .json::<T>()
                .await
                .map_err(|e| TelemetryError::Decode {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                });
        }
    }
}

#[async_trait]
impl MatchTelemetry for RiotTelemetryClient {
    async fn recent_match_ids(
        &self,
        puuid: &str,
        count: u32,
        queue_id: u16,
        start_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<MatchId>, TelemetryError> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids",
            self.config.regional_base_url, puuid
        );

        let mut query = vec![
            ("queue", queue_id.to_string()),
            ("type", "ranked".to_string()),
            ("start", "0".to_string()),
            ("count", count.to_string()),
        ];
        if let Some(start_time) = start_time {
            query.push(("startTime", start_time.timestamp().to_string()));
        }

        self.get_json("match-ids", &url, &query).await
    }

    async fn match_details(&self, match_id: &str) -> Result<MatchDetails, TelemetryError> {
        let url = format!(
            "{}/lol/match/v5/matches/{}",
            self.config.regional_base_url, match_id
        );
        let dto: MatchDto = self.get_json("match", &url, &[]).await?;
        Ok(dto.into())
    }

    async fn rank_by_summoner_id(
        &self,
        summoner_id: &str,
    ) -> Result<Option<RankInfo>, TelemetryError> {
        let url = format!(
            "{}/lol/league/v4/entries/by-summoner/{}",
            self.config.platform_base_url, summoner_id
        );
        let entries: Vec<LeagueEntryDto> = self.get_json("league-entries", &url, &[]).await?;
        Ok(solo_queue_rank(&entries))
    }
}

/// `Retry-After` in whole seconds
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn solo_queue_rank(entries: &[LeagueEntryDto]) -> Option<RankInfo> {
    let entry = entries.iter().find(|e| e.queue_type == RANKED_SOLO_QUEUE)?;
    match RankInfo::from_labels(&entry.tier, entry.rank.as_deref(), entry.league_points) {
        Ok(rank) => Some(rank),
        Err(e) => {
            warn!("Ignoring league entry with unknown rank: {}", e);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchDto {
    metadata: MetadataDto,
    info: InfoDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataDto {
    match_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoDto {
    game_creation: i64,
    game_duration: i64,
    /// Absent on matches from before patch 11.20, where `gameDuration` is in ms
    #[serde(default)]
    game_end_timestamp: Option<i64>,
    queue_id: u16,
    participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantDto {
    puuid: String,
    #[serde(default)]
    summoner_id: String,
    team_id: u32,
    #[serde(default)]
    champion_id: u32,
    #[serde(default)]
    champion_name: String,
    kills: u32,
    deaths: u32,
    assists: u32,
    #[serde(default)]
    team_position: String,
    win: bool,
    #[serde(default)]
    game_ended_in_early_surrender: bool,
    #[serde(default)]
    game_ended_in_surrender: bool,
    #[serde(default)]
    double_kills: u32,
    #[serde(default)]
    triple_kills: u32,
    #[serde(default)]
    quadra_kills: u32,
    #[serde(default)]
    penta_kills: u32,
    #[serde(default)]
    first_blood_kill: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeagueEntryDto {
    queue_type: String,
    tier: String,
    #[serde(default)]
    rank: Option<String>,
    #[serde(default)]
    league_points: u32,
}

impl From<MatchDto> for MatchDetails {
    fn from(dto: MatchDto) -> Self {
        let info = dto.info;
        let duration_secs = match info.game_end_timestamp {
            Some(_) => info.game_duration,
            None => info.game_duration / 1000,
        }
        .max(0) as u32;

        let participants = info
            .participants
            .into_iter()
            .map(|p| ParticipantStats {
                puuid: p.puuid,
                summoner_id: p.summoner_id,
                team_id: p.team_id,
                champion_id: p.champion_id,
                champion_name: p.champion_name,
                kills: p.kills,
                deaths: p.deaths,
                assists: p.assists,
                team_position: Role::from_position(&p.team_position),
                win: p.win,
                early_surrender: p.game_ended_in_early_surrender,
                surrender: p.game_ended_in_surrender,
                double_kills: p.double_kills,
                triple_kills: p.triple_kills,
                quadra_kills: p.quadra_kills,
                penta_kills: p.penta_kills,
                first_blood: p.first_blood_kill,
            })
            .collect();

        MatchDetails {
            match_id: dto.metadata.match_id,
            game_creation: timestamp_from_millis(info.game_creation),
            duration_secs,
            queue_id: info.queue_id,
            participants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::{Division, Tier};
    use axum::http::HeaderValue;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    const MATCH_JSON: &str = r#"{
        "metadata": {"matchId": "EUW1_7000000001", "participants": ["a", "b"]},
        "info": {
            "gameCreation": 1717000000000,
            "gameDuration": 1534,
            "gameEndTimestamp": 1717001600000,
            "queueId": 420,
            "participants": [
                {
                    "puuid": "a", "summonerId": "sa", "teamId": 100,
                    "championId": 222, "championName": "Jinx",
                    "kills": 12, "deaths": 0, "assists": 7,
                    "teamPosition": "BOTTOM", "win": true,
                    "gameEndedInEarlySurrender": false,
                    "gameEndedInSurrender": true,
                    "doubleKills": 2, "tripleKills": 1, "quadraKills": 1, "pentaKills": 1,
                    "firstBloodKill": true
                },
                {
                    "puuid": "b", "summonerId": "sb", "teamId": 100,
                    "championId": 412, "championName": "Thresh",
                    "kills": 1, "deaths": 2, "assists": 20,
                    "teamPosition": "UTILITY", "win": true
                }
            ]
        }
    }"#;

    fn test_config(base_url: &str) -> RiotClientConfig {
        RiotClientConfig {
            api_key: "RGAPI-test".to_string(),
            platform_base_url: base_url.to_string(),
            regional_base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
            max_rate_limit_retries: 2,
            default_retry_after: Duration::from_millis(10),
        }
    }

    async fn spawn_server(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn rate_limited() -> Response {
        let mut response = StatusCode::TOO_MANY_REQUESTS.into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static("0"));
        response
    }

    #[test]
    fn test_match_dto_conversion() {
        let dto: MatchDto = serde_json::from_str(MATCH_JSON).unwrap();
        let details: MatchDetails = dto.into();

        assert_eq!(details.match_id, "EUW1_7000000001");
        assert_eq!(details.duration_secs, 1534);
        assert_eq!(details.queue_id, 420);
        assert_eq!(details.game_creation.timestamp(), 1_717_000_000);

        let jinx = details.participant("a").unwrap();
        assert_eq!(jinx.team_position, Some(Role::Bottom));
        assert_eq!(jinx.penta_kills, 1);
        assert!(jinx.first_blood);
        assert!(jinx.surrender);

        let thresh = details.participant("b").unwrap();
        assert_eq!(thresh.team_position, Some(Role::Utility));
        assert_eq!(thresh.penta_kills, 0);
        assert!(!thresh.surrender);
        assert!(details.participant("zzz").is_none());
    }

    #[test]
    fn test_legacy_duration_in_milliseconds() {
        let json = MATCH_JSON
            .replace("\"gameDuration\": 1534", "\"gameDuration\": 1534000")
            .replace("\"gameEndTimestamp\": 1717001600000,", "");
        let dto: MatchDto = serde_json::from_str(&json).unwrap();
        let details: MatchDetails = dto.into();
        assert_eq!(details.duration_secs, 1534);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_solo_queue_rank_selection() {
        let entries: Vec<LeagueEntryDto> = serde_json::from_str(
            r#"[
                {"queueType": "RANKED_FLEX_SR", "tier": "DIAMOND", "rank": "I", "leaguePoints": 10},
                {"queueType": "RANKED_SOLO_5x5", "tier": "PLATINUM", "rank": "II", "leaguePoints": 63}
            ]"#,
        )
        .unwrap();

        let rank = solo_queue_rank(&entries).unwrap();
        assert_eq!(rank.tier, Tier::Platinum);
        assert_eq!(rank.division, Some(Division::II));
        assert_eq!(rank.league_points, 63);

        assert_eq!(solo_queue_rank(&entries[..1]), None);
    }

    #[test]
    fn test_routing_urls() {
        let config = RiotClientConfig::for_routing("key", "EUW1", "europe");
        assert_eq!(config.platform_base_url, "https://euw1.api.riotgames.com");
        assert_eq!(config.regional_base_url, "https://europe.api.riotgames.com");
        assert_eq!(config.default_retry_after, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_retries_after_rate_limit() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/lol/match/v5/matches/by-puuid/abc/ids",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        rate_limited()
                    } else {
                        Json(vec!["EUW1_2", "EUW1_1"]).into_response()
                    }
                }
            }),
        );
        let base_url = spawn_server(router).await;
        let client = RiotTelemetryClient::new(test_config(&base_url)).unwrap();

        let ids = client.recent_match_ids("abc", 20, 420, None).await.unwrap();
        assert_eq!(ids, vec!["EUW1_2".to_string(), "EUW1_1".to_string()]);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_retries_are_bounded() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/lol/match/v5/matches/EUW1_1",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    rate_limited()
                }
            }),
        );
        let base_url = spawn_server(router).await;
        let client = RiotTelemetryClient::new(test_config(&base_url)).unwrap();

        let err = client.match_details("EUW1_1").await.unwrap_err();
        assert_eq!(err, TelemetryError::RateLimited { attempts: 3 });
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let router = Router::new().route(
            "/lol/league/v4/entries/by-summoner/forbidden",
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let base_url = spawn_server(router).await;
        let client = RiotTelemetryClient::new(test_config(&base_url)).unwrap();

        let err = client.rank_by_summoner_id("forbidden").await.unwrap_err();
        assert!(matches!(err, TelemetryError::Status { status: 403, .. }));

        let err = client.match_details("EUW1_missing").await.unwrap_err();
        assert!(matches!(err, TelemetryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unranked_player_has_no_rank() {
        let router = Router::new().route(
            "/lol/league/v4/entries/by-summoner/fresh",
            get(|| async { Json(Vec::<serde_json::Value>::new()) }),
        );
        let base_url = spawn_server(router).await;
        let client = RiotTelemetryClient::new(test_config(&base_url)).unwrap();

        assert_eq!(client.rank_by_summoner_id("fresh").await.unwrap(), None);
    }
}
