// Configuration module for tmdb-cache
// Layers a TOML config file under environment-variable overrides

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const APP_NAME: &str = "tmdb-cache";
const CONFIG_FILENAME: &str = "config.toml";
const DEFAULT_CACHE_PATH: &str = "tmdb_cache.json";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Search provider configuration
    pub search: SearchConfig,

    /// Catalog feed configuration
    pub catalog: CatalogConfig,

    /// Output configuration
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Apify access token (enables TMDb searching)
    pub apify_token: Option<String>,

    /// Candidates requested per search (default: 5)
    pub results_wanted: u32,

    /// Minimum spacing between search calls in milliseconds (default: 500)
    pub request_interval_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            apify_token: None,
            results_wanted: 5,
            request_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Titles requested per catalog query (default: 20)
    pub limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { limit: 20 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the cache document is written (default: tmdb_cache.json)
    pub cache_path: Option<PathBuf>,
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Apify access token, if configured
    pub apify_token: Option<String>,

    /// Cache document path
    pub output_path: PathBuf,

    /// Titles requested per catalog query
    pub catalog_limit: u32,

    /// Candidates requested per search
    pub results_wanted: u32,

    /// Minimum spacing between search calls
    pub request_interval: Duration,
}

impl AppConfig {
    /// Load configuration from the TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (APIFY_TOKEN, TMDB_CACHE_OUTPUT)
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_file)
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        // Environment variable takes priority
        if let Ok(path) = std::env::var("TMDB_CACHE_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        // Then XDG config dir
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        // Fallback to current directory
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &std::path::Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Self {
        // Apify token: env > config
        let apify_token = std::env::var("APIFY_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or(config_file.search.apify_token);

        // Output path: env > config > default
        let output_path = std::env::var("TMDB_CACHE_OUTPUT")
            .ok()
            .map(PathBuf::from)
            .or(config_file.output.cache_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH));

        Self {
            apify_token,
            output_path,
            catalog_limit: config_file.catalog.limit,
            results_wanted: config_file.search.results_wanted,
            request_interval: Duration::from_millis(config_file.search.request_interval_ms),
        }
    }

    /// Log configuration status
    pub fn log_config(&self) {
        tracing::info!("Cache output: {}", self.output_path.display());
        tracing::debug!(
            "Catalog limit: {}, results wanted: {}, request interval: {:?}",
            self.catalog_limit,
            self.results_wanted,
            self.request_interval
        );

        if self.apify_token.is_some() {
            tracing::info!("TMDb search: enabled (Apify token present)");
        } else {
            tracing::info!("TMDb search: disabled");
            tracing::info!("Hint: Add apify_token to config.toml or set APIFY_TOKEN env var");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert!(config.search.apify_token.is_none());
        assert_eq!(config.search.results_wanted, 5);
        assert_eq!(config.search.request_interval_ms, 500);
        assert_eq!(config.catalog.limit, 20);
        assert!(config.output.cache_path.is_none());
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[search]
apify_token = "test_token"
results_wanted = 10
request_interval_ms = 1000

[catalog]
limit = 50

[output]
cache_path = "/data/tmdb_cache.json"
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.search.apify_token, Some("test_token".to_string()));
        assert_eq!(config.search.results_wanted, 10);
        assert_eq!(config.search.request_interval_ms, 1000);
        assert_eq!(config.catalog.limit, 50);
        assert_eq!(
            config.output.cache_path,
            Some(PathBuf::from("/data/tmdb_cache.json"))
        );
    }

    #[test]
    fn test_partial_config_toml() {
        // Partial configs work (only specify what you need)
        let toml_str = r#"
[catalog]
limit = 5
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.limit, 5);
        assert_eq!(config.search.results_wanted, 5); // default
    }

    #[test]
    fn test_request_interval_from_millis() {
        let toml_str = r#"
[search]
request_interval_ms = 250
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        let config = AppConfig::build(file);
        assert_eq!(config.request_interval, Duration::from_millis(250));
    }
}
