//! Profile page fetching.
//!
//! One bounded HTTP request per game account against the external profile
//! site. Fetch failures are converted to an empty snapshot at this layer so a
//! slow or broken upstream page can only ever affect its own result, never
//! the rest of a fan-out batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::extract::RankExtract;
use crate::models::{RankSnapshot, RiotAccount};

/// Errors internal to a single profile fetch. Callers of [`FetchProfile`]
/// never see these; they are logged and folded into an empty snapshot.
#[derive(Debug, Error)]
pub enum ProfileFetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid profile base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Configuration for the profile fetcher.
#[derive(Debug, Clone)]
pub struct ProfileFetcherConfig {
    /// Base URL of the profile site (region and account are appended).
    pub base_url: String,

    /// Request timeout applied uniformly to every scrape.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl Default for ProfileFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://op.gg/lol/summoners".to_string(),
            timeout: Duration::from_secs(15),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// The fetch seam the aggregation layer depends on.
///
/// Infallible by contract: implementations convert their own failures into
/// [`RankSnapshot::empty`].
#[async_trait]
pub trait FetchProfile: Send + Sync {
    /// Best-effort snapshot for one account.
    async fn fetch_snapshot(&self, account: &RiotAccount) -> RankSnapshot;
}

/// HTTP profile fetcher delegating body parsing to a [`RankExtract`] strategy.
pub struct ProfileFetcher {
    client: Client,
    config: ProfileFetcherConfig,
    extractor: Arc<dyn RankExtract>,
}

impl ProfileFetcher {
    /// Create a new fetcher with the given configuration and extraction
    /// strategy.
    pub fn new(
        config: ProfileFetcherConfig,
        extractor: Arc<dyn RankExtract>,
    ) -> Result<Self, ProfileFetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("rift-overlay/0.1.0")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            config,
            extractor,
        })
    }

    /// Build `<base>/<lowercased region>/<handle>-<tag>` with URL-encoded
    /// path segments.
    fn profile_url(&self, account: &RiotAccount) -> Result<Url, ProfileFetchError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|_| ProfileFetchError::InvalidBaseUrl(self.config.base_url.clone()))?;

        let segment = format!("{}-{}", account.game_name, account.tag_line);
        url.path_segments_mut()
            .map_err(|_| ProfileFetchError::InvalidBaseUrl(self.config.base_url.clone()))?
            .push(&account.region.to_lowercase())
            .push(&segment);

        Ok(url)
    }

    async fn try_fetch(&self, account: &RiotAccount) -> Result<RankSnapshot, ProfileFetchError> {
        let url = self.profile_url(account)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProfileFetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let html = response.text().await?;
        Ok(self.extractor.extract(&html))
    }
}

#[async_trait]
impl FetchProfile for ProfileFetcher {
    async fn fetch_snapshot(&self, account: &RiotAccount) -> RankSnapshot {
        match self.try_fetch(account).await {
            Ok(snapshot) => {
                debug!(
                    "Fetched {}: {} {} LP, ladder {}",
                    account.identity(),
                    if snapshot.rank.is_empty() {
                        "N/A"
                    } else {
                        snapshot.rank.as_str()
                    },
                    snapshot.league_points,
                    if snapshot.region_rank.is_empty() {
                        "N/A"
                    } else {
                        snapshot.region_rank.as_str()
                    },
                );
                snapshot
            }
            Err(e) => {
                warn!("Failed to fetch profile for {}: {}", account.identity(), e);
                RankSnapshot::empty()
            }
        }
    }
}

/// Scripted fetcher for testing: maps `handle#tag` to a fixed snapshot,
/// everything else resolves empty.
#[cfg(test)]
pub struct ScriptedFetcher {
    responses: std::collections::HashMap<String, RankSnapshot>,
}

#[cfg(test)]
impl ScriptedFetcher {
    pub fn new(responses: Vec<(&str, RankSnapshot)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// A fetcher where every account fails (empty snapshot).
    pub fn failing() -> Self {
        Self {
            responses: std::collections::HashMap::new(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl FetchProfile for ScriptedFetcher {
    async fn fetch_snapshot(&self, account: &RiotAccount) -> RankSnapshot {
        self.responses
            .get(&account.identity())
            .cloned()
            .unwrap_or_else(RankSnapshot::empty)
    }
}
