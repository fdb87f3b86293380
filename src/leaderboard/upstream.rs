//! Upstream ranking API clients.
//!
//! Fetches the authoritative leaderboard listing and the optional
//! privileged-account league entry. All upstream API specifics are isolated
//! in this module so endpoint changes are easy to fix; payloads are treated
//! as untrusted and validated before use.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors from the upstream ranking API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Unexpected leaderboard response shape: {0}")]
    Shape(String),
}

// ── Wire types ──────────────────────────────────────────────────────────────

/// One player as listed by the upstream leaderboard API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamPlayer {
    pub display_name: String,

    #[serde(default)]
    pub team: String,

    pub game_name: String,

    pub tag_line: String,

    pub rank: UpstreamRank,

    #[serde(default)]
    pub is_live: bool,
}

/// Nested rank block of an upstream player.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRank {
    pub rank: String,
    pub tier: String,
    pub league_points: u32,
}

/// Top-level leaderboard payload. `players` is mandatory; a response without
/// it fails deserialization and the assembly fails closed.
#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    players: Vec<UpstreamPlayer>,
}

/// One entry of the privileged league lookup (array response).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    #[serde(default)]
    pub rank: String,

    #[serde(default)]
    pub tier: String,

    #[serde(default)]
    pub league_points: u32,
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Configuration for the leaderboard API client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Full URL of the leaderboard listing endpoint.
    pub leaderboard_url: String,

    /// Request timeout for upstream API calls.
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            leaderboard_url: "https://dpm.lol/v1/leaderboards/custom/29e4e979-4c43-4ac7-bf5f-5f5195551f66".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Credentials and target for the privileged-account override lookup.
///
/// The API key may come from configuration or the `RIOT_API_KEY` environment
/// variable; the lookup is disabled unless both key and PUUID are present.
#[derive(Debug, Clone, Default)]
pub struct PrivilegedConfig {
    /// League entries endpoint, `<base>/<puuid>` once the PUUID is appended.
    pub entries_url: String,

    /// API key; falls back to the `RIOT_API_KEY` environment variable.
    pub api_key: Option<String>,

    /// Encrypted PUUID of the privileged account.
    pub puuid: Option<String>,
}

impl PrivilegedConfig {
    /// Resolve the API key from config or environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("RIOT_API_KEY").ok().filter(|k| !k.is_empty()))
    }

    /// Whether the lookup has everything it needs.
    pub fn is_enabled(&self) -> bool {
        self.resolved_api_key().is_some()
            && self
                .puuid
                .as_deref()
                .map(|p| !p.trim().is_empty())
                .unwrap_or(false)
    }
}

// ── Source seam ─────────────────────────────────────────────────────────────

/// The upstream seam the assembler depends on.
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    /// Authoritative leaderboard listing. Errors here fail the assembly.
    async fn fetch_players(&self) -> Result<Vec<UpstreamPlayer>, UpstreamError>;

    /// Privileged league entry for the override step. `Ok(None)` when the
    /// lookup is not configured or returned no entries.
    async fn fetch_privileged_entry(&self) -> Result<Option<LeagueEntry>, UpstreamError>;
}

/// HTTP client for the upstream ranking API.
pub struct HttpLeaderboardClient {
    client: Client,
    config: UpstreamConfig,
    privileged: PrivilegedConfig,
}

impl HttpLeaderboardClient {
    pub fn new(
        config: UpstreamConfig,
        privileged: PrivilegedConfig,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            privileged,
        })
    }
}

#[async_trait]
impl LeaderboardSource for HttpLeaderboardClient {
    async fn fetch_players(&self) -> Result<Vec<UpstreamPlayer>, UpstreamError> {
        info!("Fetching leaderboard from {}", self.config.leaderboard_url);

        let response = self
            .client
            .get(&self.config.leaderboard_url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        let payload: UpstreamResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Shape(e.to_string()))?;

        Ok(payload.players)
    }

    async fn fetch_privileged_entry(&self) -> Result<Option<LeagueEntry>, UpstreamError> {
        let Some(api_key) = self.privileged.resolved_api_key() else {
            return Ok(None);
        };
        let Some(puuid) = self.privileged.puuid.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        let url = format!("{}/{}", self.privileged.entries_url.trim_end_matches('/'), puuid);
        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("X-Riot-Token", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let entries: Vec<LeagueEntry> = response.json().await?;
        Ok(entries.into_iter().next())
    }
}

/// Scripted source for testing: fixed listing, optional privileged entry,
/// optional forced failures.
#[cfg(test)]
pub struct ScriptedSource {
    pub players: Vec<UpstreamPlayer>,
    pub privileged: Option<LeagueEntry>,
    pub fail_listing: bool,
    pub fail_privileged: bool,
}

#[cfg(test)]
impl ScriptedSource {
    pub fn listing(players: Vec<UpstreamPlayer>) -> Self {
        Self {
            players,
            privileged: None,
            fail_listing: false,
            fail_privileged: false,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl LeaderboardSource for ScriptedSource {
    async fn fetch_players(&self) -> Result<Vec<UpstreamPlayer>, UpstreamError> {
        if self.fail_listing {
            return Err(UpstreamError::Shape("scripted failure".to_string()));
        }
        Ok(self.players.clone())
    }

    async fn fetch_privileged_entry(&self) -> Result<Option<LeagueEntry>, UpstreamError> {
        if self.fail_privileged {
            return Err(UpstreamError::HttpStatus {
                status: 503,
                message: "scripted failure".to_string(),
            });
        }
        Ok(self.privileged.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_payload_deserializes() {
        let json = r#"{
            "players": [{
                "displayName": "A",
                "team": "X",
                "gameName": "a1",
                "tagLine": "EUW",
                "rank": { "rank": "I", "tier": "GOLD", "leaguePoints": 50 },
                "isLive": false
            }]
        }"#;

        let payload: UpstreamResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.players.len(), 1);
        assert_eq!(payload.players[0].display_name, "A");
        assert_eq!(payload.players[0].rank.league_points, 50);
    }

    #[test]
    fn test_missing_players_field_fails_closed() {
        let json = r#"{ "member": [] }"#;
        let result: Result<UpstreamResponse, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_players_must_be_an_array() {
        let json = r#"{ "players": "oops" }"#;
        let result: Result<UpstreamResponse, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_league_entry_tolerates_missing_fields() {
        let entry: LeagueEntry = serde_json::from_str(r#"{ "leaguePoints": 812 }"#).unwrap();
        assert_eq!(entry.league_points, 812);
        assert_eq!(entry.tier, "");
    }

    #[test]
    fn test_privileged_config_disabled_without_credentials() {
        let config = PrivilegedConfig::default();
        assert!(!config.is_enabled());

        let partial = PrivilegedConfig {
            api_key: Some("key".to_string()),
            puuid: None,
            ..Default::default()
        };
        assert!(!partial.is_enabled());
    }

    #[test]
    fn test_privileged_config_enabled_with_both() {
        let config = PrivilegedConfig {
            entries_url: "https://euw1.api.riotgames.com/lol/league/v4/entries/by-puuid"
                .to_string(),
            api_key: Some("key".to_string()),
            puuid: Some("puuid".to_string()),
        };
        assert!(config.is_enabled());
    }

    #[test]
    fn test_upstream_config_default() {
        let config = UpstreamConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.leaderboard_url.starts_with("https://"));
    }
}
