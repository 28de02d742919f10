// Batch cache generation: gather titles, resolve each to a TMDb id,
// write the mapping as one JSON document.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::matcher::{classify, normalize, select_candidate};
use crate::models::{MatchResult, MediaType, TitleRecord};
use crate::services::imdb::{default_queries, ImdbClient};
use crate::services::tmdb::TmdbClient;

/// Well-known series that must appear in the cache even when the catalog
/// feed does not surface them.
const SEED_SERIES: [&str; 6] = [
    "The Simpsons",
    "Family Guy",
    "South Park",
    "Futurama",
    "Rick and Morty",
    "American Dad!",
];

/// Hard-pinned results for titles whose automatic resolution is known to be
/// unreliable. Keyed by normalized title; each key appears at most once.
/// Checked before any search call, so pinned titles never hit the provider.
fn override_for(normalized_title: &str) -> Option<MatchResult> {
    match normalized_title {
        "rick and morty" => Some(MatchResult {
            id: "60625".to_string(),
            media_type: MediaType::Tv,
        }),
        _ => None,
    }
}

/// Keep only the first occurrence of each exact `primary_title` string,
/// preserving first-seen order.
fn dedup_titles(titles: Vec<TitleRecord>) -> Vec<TitleRecord> {
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .filter(|t| seen.insert(t.primary_title.clone()))
        .collect()
}

fn seed_titles() -> Vec<TitleRecord> {
    SEED_SERIES.iter().map(|name| TitleRecord::seed(name)).collect()
}

/// Builds the normalized-title -> TMDb id mapping for one batch run.
///
/// The mapping is assembled in memory and written out once at the end; a run
/// that dies partway leaves the previous cache document untouched. Keys are
/// unique per normalized title, later inserts for the same key overwrite
/// earlier ones.
pub struct CacheBuilder {
    imdb: ImdbClient,
    tmdb: Option<TmdbClient>,
    catalog_limit: u32,
    results_wanted: u32,
    output_path: PathBuf,
    entries: BTreeMap<String, MatchResult>,
}

impl CacheBuilder {
    pub fn new(imdb: ImdbClient, tmdb: Option<TmdbClient>, config: &AppConfig) -> Self {
        Self {
            imdb,
            tmdb,
            catalog_limit: config.catalog_limit,
            results_wanted: config.results_wanted,
            output_path: config.output_path.clone(),
            entries: BTreeMap::new(),
        }
    }

    /// Run the full pipeline: gather, deduplicate, resolve, persist.
    ///
    /// Per-title failures are logged and skipped; only a failure to write the
    /// final document aborts the run.
    pub async fn run(mut self) -> Result<()> {
        if self.tmdb.is_none() {
            tracing::warn!(
                "APIFY_TOKEN is not set; only pinned override titles will be resolved"
            );
        }

        tracing::info!("Gathering titles from IMDb...");
        let gathered = self.gather().await;

        let unique = dedup_titles(gathered);
        let total = unique.len();
        tracing::info!("Resolving TMDb ids for {} unique titles...", total);

        for (index, record) in unique.iter().enumerate() {
            self.resolve_title(index + 1, total, record).await;
        }

        self.persist().await
    }

    /// Pull titles from each catalog query, then append the seed list.
    /// A failed query contributes nothing instead of aborting the gather.
    async fn gather(&self) -> Vec<TitleRecord> {
        let mut titles = Vec::new();

        for query in default_queries(self.catalog_limit) {
            match self.imdb.fetch_titles(&query).await {
                Ok(batch) => {
                    tracing::info!("{}: {} titles", query.sort_by, batch.len());
                    titles.extend(batch);
                }
                Err(e) => {
                    tracing::warn!("{} contributed no titles: {}", query.sort_by, e);
                }
            }
        }

        titles.extend(seed_titles());
        titles
    }

    /// Resolve one title into at most one cache entry.
    async fn resolve_title(&mut self, index: usize, total: usize, record: &TitleRecord) {
        let name = &record.primary_title;
        let key = normalize(name);

        if let Some(pinned) = override_for(&key) {
            tracing::info!("[{}/{}] {} -> {} (pinned)", index, total, name, pinned.id);
            self.entries.insert(key, pinned);
            return;
        }

        let Some(tmdb) = &self.tmdb else {
            tracing::debug!("[{}/{}] skipped {}: no search credential", index, total, name);
            return;
        };

        let candidates = match tmdb
            .search(name, MediaType::Movie, self.results_wanted)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("[{}/{}] skipped {}: {}", index, total, name, e);
                return;
            }
        };

        let outcome = select_candidate(name, record.start_year, &candidates);
        if outcome.is_fallback() {
            tracing::warn!(
                "[{}/{}] no exact title/year match for {}, using top result",
                index,
                total,
                name
            );
        }

        let Some(candidate) = outcome.into_candidate() else {
            tracing::info!("[{}/{}] no TMDb results for {}", index, total, name);
            return;
        };

        let Some(id) = candidate.external_id() else {
            tracing::warn!("[{}/{}] skipped {}: candidate has no id", index, total, name);
            return;
        };

        let media_type = classify(&candidate);
        tracing::info!("[{}/{}] {} -> {} ({})", index, total, name, id, media_type);
        self.entries.insert(key, MatchResult { id, media_type });
    }

    /// Write the complete mapping once, pretty-printed, overwriting any
    /// previous document.
    async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize cache entries")?;
        tokio::fs::write(&self.output_path, json)
            .await
            .with_context(|| {
                format!("Failed to write cache document {}", self.output_path.display())
            })?;

        tracing::info!(
            "Wrote {} cache entries to {}",
            self.entries.len(),
            self.output_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn test_config(output_path: PathBuf) -> AppConfig {
        AppConfig {
            apify_token: None,
            output_path,
            catalog_limit: 20,
            results_wanted: 5,
            request_interval: Duration::from_millis(500),
        }
    }

    fn titled(name: &str) -> TitleRecord {
        TitleRecord::seed(name)
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let titles = vec![titled("A"), titled("B"), titled("A"), titled("C")];
        let unique = dedup_titles(titles);
        let names: Vec<&str> = unique.iter().map(|t| t.primary_title.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dedup_is_exact_string_match() {
        // Dedup happens on the raw title string; normalization only applies
        // to cache keys.
        let titles = vec![titled("Heat"), titled("heat")];
        assert_eq!(dedup_titles(titles).len(), 2);
    }

    #[test]
    fn test_seed_list_includes_must_have_series() {
        let seeds = seed_titles();
        assert!(seeds.iter().all(|t| t.start_year.is_none()));
        assert!(seeds.iter().any(|t| t.primary_title == "Rick and Morty"));
        assert!(seeds.iter().any(|t| t.primary_title == "The Simpsons"));
    }

    #[test]
    fn test_override_table_is_keyed_by_normalized_title() {
        let pinned = override_for("rick and morty").unwrap();
        assert_eq!(pinned.id, "60625");
        assert_eq!(pinned.media_type, MediaType::Tv);
        assert!(override_for("inception").is_none());
    }

    #[tokio::test]
    async fn test_pinned_title_resolves_without_search_client() {
        let config = test_config(PathBuf::from("tmdb_cache.json"));
        let mut builder = CacheBuilder::new(ImdbClient::new(), None, &config);

        builder.resolve_title(1, 1, &titled("Rick and Morty")).await;

        assert_eq!(
            builder.entries.get("rick and morty"),
            Some(&MatchResult {
                id: "60625".to_string(),
                media_type: MediaType::Tv,
            })
        );
    }

    #[tokio::test]
    async fn test_unpinned_title_without_client_produces_no_entry() {
        let config = test_config(PathBuf::from("tmdb_cache.json"));
        let mut builder = CacheBuilder::new(ImdbClient::new(), None, &config);

        builder.resolve_title(1, 1, &titled("Inception")).await;

        assert!(builder.entries.is_empty());
    }

    #[tokio::test]
    async fn test_gather_survives_unavailable_catalog_feed() {
        // Every catalog query fails against an unreachable feed; the gather
        // still completes and contributes the seed list.
        let config = test_config(PathBuf::from("tmdb_cache.json"));
        let imdb = ImdbClient::with_base_url("http://127.0.0.1:9");
        let builder = CacheBuilder::new(imdb, None, &config);

        let gathered = builder.gather().await;

        let names: Vec<&str> = gathered.iter().map(|t| t.primary_title.as_str()).collect();
        assert_eq!(names.len(), SEED_SERIES.len());
        assert!(names.contains(&"Futurama"));
    }

    #[tokio::test]
    async fn test_persist_writes_complete_document() {
        let path = std::env::temp_dir().join(format!(
            "tmdb_cache_test_{}.json",
            std::process::id()
        ));
        let config = test_config(path.clone());
        let mut builder = CacheBuilder::new(ImdbClient::new(), None, &config);

        builder.resolve_title(1, 1, &titled("Rick and Morty")).await;
        builder.persist().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, MatchResult> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["rick and morty"].id, "60625");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_later_insert_overwrites_same_key() {
        let mut entries: BTreeMap<String, MatchResult> = BTreeMap::new();
        entries.insert(
            "heat".to_string(),
            MatchResult {
                id: "1".to_string(),
                media_type: MediaType::Movie,
            },
        );
        entries.insert(
            "heat".to_string(),
            MatchResult {
                id: "949".to_string(),
                media_type: MediaType::Movie,
            },
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["heat"].id, "949");
    }
}
