//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::extract::ExtractorKind;
use crate::models::Roster;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Leaderboard pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Upstream leaderboard listing endpoint.
    #[serde(default = "default_leaderboard_url")]
    pub leaderboard_url: String,

    /// Base URL of the scraped profile site.
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,

    /// Timeout for upstream API calls.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Timeout applied to every profile scrape.
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_secs: u64,

    /// TTL of the cached assembled leaderboard.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_minutes: u64,

    /// Extraction strategy: "regex" or "selector".
    #[serde(default)]
    pub extractor: ExtractorKind,

    /// Region assumed for entries without roster accounts.
    #[serde(default = "default_region")]
    pub default_region: String,
}

fn default_leaderboard_url() -> String {
    "https://dpm.lol/v1/leaderboards/custom/29e4e979-4c43-4ac7-bf5f-5f5195551f66".to_string()
}

fn default_profile_base_url() -> String {
    "https://op.gg/lol/summoners".to_string()
}

fn default_upstream_timeout() -> u64 {
    5
}

fn default_scrape_timeout() -> u64 {
    15
}

fn default_cache_ttl() -> u64 {
    15
}

fn default_region() -> String {
    "EUW".to_string()
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            leaderboard_url: default_leaderboard_url(),
            profile_base_url: default_profile_base_url(),
            upstream_timeout_secs: default_upstream_timeout(),
            scrape_timeout_secs: default_scrape_timeout(),
            cache_ttl_minutes: default_cache_ttl(),
            extractor: ExtractorKind::default(),
            default_region: default_region(),
        }
    }
}

/// Privileged-account override configuration. Disabled unless both an API
/// key (here or in the `RIOT_API_KEY` environment variable) and a PUUID are
/// present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Canonical player name whose entry may be overridden.
    #[serde(default)]
    pub player: String,

    /// Display handle promoted onto the overridden entry.
    #[serde(default)]
    pub handle: Option<String>,

    /// League entries endpoint (PUUID appended).
    #[serde(default = "default_entries_url")]
    pub entries_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub puuid: Option<String>,
}

fn default_entries_url() -> String {
    "https://euw1.api.riotgames.com/lol/league/v4/entries/by-puuid".to_string()
}

/// Result cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Background sweep interval.
    #[serde(default = "default_sweep_minutes")]
    pub sweep_minutes: u64,
}

fn default_sweep_minutes() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_minutes: default_sweep_minutes(),
        }
    }
}

/// Cleanup scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Interval expression ("6h", "30m"); invalid values fall back to 6h.
    #[serde(default = "default_cleanup_interval")]
    pub interval: String,
}

fn default_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> String {
    "6h".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval: default_cleanup_interval(),
        }
    }
}

/// Overlay store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Default lifetime of newly created overlays.
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: i64,
}

fn default_expiration_hours() -> i64 {
    2
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            expiration_hours: default_expiration_hours(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    #[serde(default, rename = "override")]
    pub override_account: OverrideConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Static player roster used to resolve multi-account players.
    #[serde(default)]
    pub roster: Roster,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            override_account: OverrideConfig::default(),
            cache: CacheConfig::default(),
            scheduler: SchedulerConfig::default(),
            overlay: OverlayConfig::default(),
            roster: Roster::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.leaderboard.upstream_timeout_secs == 0
            || self.leaderboard.scrape_timeout_secs == 0
        {
            return Err(ConfigError::ValidationError(
                "Request timeouts must be greater than 0".to_string(),
            ));
        }

        if self.leaderboard.cache_ttl_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "Leaderboard cache TTL must be greater than 0".to_string(),
            ));
        }

        if self.overlay.expiration_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "Overlay expiration must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
