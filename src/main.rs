use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod config;
mod matcher;
mod models;
mod services;

use cache::CacheBuilder;
use config::AppConfig;
use matcher::select_candidate;
use models::MediaType;
use services::imdb::ImdbClient;
use services::tmdb::TmdbClient;

#[derive(Parser)]
#[command(name = "tmdb-cache")]
#[command(version)]
#[command(about = "Resolve media titles to TMDb ids and build a lookup cache")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gather titles from IMDb and build the full title -> TMDb id cache
    Generate,

    /// Resolve a single title and print the result
    Lookup {
        /// Title to search for
        title: String,

        /// Release year, for disambiguation
        year: Option<i32>,

        /// Content type hint passed to the search provider
        #[arg(long, value_enum, default_value_t = MediaType::Movie)]
        media_type: MediaType,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tmdb_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load();

    match cli.command {
        Commands::Generate => run_generate(&config).await,
        Commands::Lookup {
            title,
            year,
            media_type,
        } => run_lookup(&config, &title, year, media_type).await,
    }
}

/// Full batch pipeline: gather, deduplicate, resolve, persist.
async fn run_generate(config: &AppConfig) -> Result<()> {
    config.log_config();

    let tmdb = config
        .apify_token
        .clone()
        .map(|token| TmdbClient::new(token, config.request_interval));

    CacheBuilder::new(ImdbClient::new(), tmdb, config).run().await
}

/// Resolve one title and report the result, without touching the cache file.
async fn run_lookup(
    config: &AppConfig,
    title: &str,
    year: Option<i32>,
    media_type: MediaType,
) -> Result<()> {
    let tmdb = config
        .apify_token
        .clone()
        .map(|token| TmdbClient::new(token, config.request_interval))
        .context("APIFY_TOKEN is not set (environment or config.toml)")?;

    println!(
        "Searching TMDb for: {} ({})",
        title,
        year.map(|y| y.to_string())
            .unwrap_or_else(|| "Any Year".to_string())
    );

    let candidates = tmdb
        .search(title, media_type, config.results_wanted)
        .await?;

    if candidates.is_empty() {
        println!("No results found on TMDb.");
        return Ok(());
    }

    println!(
        "Found {} potential matches. Matching title and year...",
        candidates.len()
    );

    let outcome = select_candidate(title, year, &candidates);
    if outcome.is_fallback() {
        println!("Warning: No exact year/title match found. Defaulting to most popular result.");
    }

    let Some(candidate) = outcome.into_candidate() else {
        println!("No match found.");
        return Ok(());
    };

    let Some(id) = candidate.external_id() else {
        println!("Top result for '{}' carries no TMDb id.", title);
        return Ok(());
    };

    let resolved_type = matcher::classify(&candidate);
    let overview: String = candidate
        .overview
        .as_deref()
        .unwrap_or("N/A")
        .chars()
        .take(100)
        .collect();

    println!();
    println!("Match Found!");
    println!("{}", "-".repeat(30));
    println!("Title: {}", candidate.display_name());
    println!("Year: {}", candidate.year_str());
    println!("TMDb ID: {}", id);
    println!("Media Type: {}", resolved_type);
    println!("Overview: {}...", overview);
    println!("{}", "-".repeat(30));

    Ok(())
}
