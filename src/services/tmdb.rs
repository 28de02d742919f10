// TMDb search via the Apify themoviedb-scraper actor
// API Documentation: https://docs.apify.com/api/v2#/reference/actors/run-actor-synchronously-and-get-dataset-items

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::{CandidateItem, MediaType};

const APIFY_ACTOR_URL: &str =
    "https://api.apify.com/v2/acts/shahidirfan~themoviedb-scraper/run-sync-get-dataset-items";

/// Apify TMDb scraper client with call spacing.
///
/// The actor is a shared, externally rate-limited resource; consecutive
/// searches are spaced by a fixed minimum interval so batch runs do not
/// burst it.
pub struct TmdbClient {
    client: Client,
    token: String,
    min_interval: Duration,
    last_request: Arc<Mutex<Instant>>,
}

/// Actor input for one synchronous search run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorInput {
    use_api_first: bool,
    content_type: String,
    search_queries: String,
    results_wanted: u32,
    max_pages: u32,
    sort_by: String,
    proxy_configuration: ProxyConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyConfiguration {
    use_apify_proxy: bool,
}

impl TmdbClient {
    /// Create a new client with the given access token.
    pub fn new(token: String, min_interval: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            token,
            min_interval,
            // Backdated so the first call goes out immediately
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(60))),
        }
    }

    /// Create a client from the `APIFY_TOKEN` environment variable.
    pub fn from_env(min_interval: Duration) -> Option<Self> {
        std::env::var("APIFY_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(|token| Self::new(token, min_interval))
    }

    /// Enforce the minimum spacing between consecutive actor calls.
    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            let wait = self.min_interval - elapsed;
            tracing::debug!("TMDb rate limit: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        *last = Instant::now();
    }

    /// Search TMDb for a title, most-relevant candidates first.
    ///
    /// A non-success actor status is logged and yields an empty candidate
    /// list, so one unavailable search degrades to "no match" for that title.
    pub async fn search(
        &self,
        query: &str,
        content_type: MediaType,
        results_wanted: u32,
    ) -> Result<Vec<CandidateItem>> {
        self.rate_limit().await;

        let url = format!(
            "{}?token={}",
            APIFY_ACTOR_URL,
            urlencoding::encode(&self.token)
        );

        let input = ActorInput {
            use_api_first: true,
            content_type: content_type.to_string(),
            search_queries: query.to_string(),
            results_wanted,
            max_pages: 2,
            sort_by: "popularity.desc".to_string(),
            proxy_configuration: ProxyConfiguration {
                use_apify_proxy: true,
            },
        };

        tracing::debug!("TMDb search: {}", query);

        let response = self
            .client
            .post(&url)
            .json(&input)
            .send()
            .await
            .context("Failed to call TMDb scraper")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("TMDb search failed: {} - {}", status, text);
            return Ok(vec![]);
        }

        let items: Vec<CandidateItem> = response
            .json()
            .await
            .context("Failed to parse TMDb scraper response")?;

        Ok(items)
    }
}
