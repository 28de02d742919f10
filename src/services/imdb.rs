// IMDb catalog feed client
// API Documentation: https://imdbapi.dev/

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::TitleRecord;

const IMDB_API_BASE: &str = "https://api.imdbapi.dev";

/// One catalog query: a sort criterion plus a result limit.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub sort_by: &'static str,
    pub sort_order: Option<&'static str>,
    pub limit: u32,
}

/// The catalog queries a batch run gathers from: most recent,
/// most popular, and highest rated.
pub fn default_queries(limit: u32) -> Vec<CatalogQuery> {
    vec![
        CatalogQuery {
            sort_by: "SORT_BY_RELEASE_DATE",
            sort_order: Some("DESC"),
            limit,
        },
        CatalogQuery {
            sort_by: "SORT_BY_POPULARITY",
            sort_order: None,
            limit,
        },
        CatalogQuery {
            sort_by: "SORT_BY_USER_RATING",
            sort_order: Some("DESC"),
            limit,
        },
    ]
}

#[derive(Debug, Deserialize)]
struct TitlesResponse {
    #[serde(default)]
    titles: Vec<TitleRecord>,
}

/// IMDb API client.
pub struct ImdbClient {
    client: Client,
    base_url: String,
}

impl ImdbClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: IMDB_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch titles for one catalog query.
    ///
    /// A non-success status is logged and yields an empty list; network and
    /// parse errors surface as `Err` for the caller to downgrade.
    pub async fn fetch_titles(&self, query: &CatalogQuery) -> Result<Vec<TitleRecord>> {
        let mut url = format!("{}/titles?sortBy={}", self.base_url, query.sort_by);
        if let Some(order) = query.sort_order {
            url.push_str(&format!("&sortOrder={}", order));
        }
        url.push_str(&format!("&limit={}", query.limit));

        tracing::debug!("IMDb catalog fetch: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to fetch IMDb titles")?;

        if !response.status().is_success() {
            tracing::warn!("IMDb catalog request failed: {}", response.status());
            return Ok(vec![]);
        }

        let result: TitlesResponse = response
            .json()
            .await
            .context("Failed to parse IMDb titles response")?;

        Ok(result.titles)
    }
}

impl Default for ImdbClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_queries_cover_three_sorts() {
        let queries = default_queries(20);
        assert_eq!(queries.len(), 3);
        assert!(queries.iter().all(|q| q.limit == 20));
        assert_eq!(queries[0].sort_by, "SORT_BY_RELEASE_DATE");
        assert_eq!(queries[1].sort_by, "SORT_BY_POPULARITY");
        assert_eq!(queries[2].sort_by, "SORT_BY_USER_RATING");
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_an_error_not_a_panic() {
        // Port 9 (discard) is not listening; the fetch must fail cleanly so
        // the gather step can downgrade it to an empty contribution.
        let client = ImdbClient::with_base_url("http://127.0.0.1:9");
        let queries = default_queries(5);
        let result = client.fetch_titles(&queries[0]).await;
        assert!(result.is_err());
    }
}
