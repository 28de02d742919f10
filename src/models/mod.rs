use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A title gathered from the IMDb catalog feed or the static seed list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRecord {
    pub primary_title: String,
    #[serde(default)]
    pub start_year: Option<i32>,
}

impl TitleRecord {
    /// A seed-list entry: a well-known series name with no year attached.
    pub fn seed(name: &str) -> Self {
        Self {
            primary_title: name.to_string(),
            start_year: None,
        }
    }
}

/// One raw search result from the Apify TMDb scraper dataset.
///
/// Which fields are populated depends on whether TMDb classified the work as
/// a movie (title/release date) or a series (name/first air date). The
/// scraper has emitted both camelCase and snake_case date keys, so both are
/// accepted. Every field is optional; a malformed item simply deserializes
/// with gaps instead of failing the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateItem {
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "releaseDate", alias = "release_date", default)]
    pub release_date: Option<String>,
    #[serde(rename = "firstAirDate", alias = "first_air_date", default)]
    pub first_air_date: Option<String>,
    pub id: Option<i64>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    pub overview: Option<String>,
}

impl CandidateItem {
    /// Display name, whichever of the movie-style or series-style field is set.
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    /// First present, non-empty release-date-like field.
    pub fn release_date_like(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .or_else(|| self.first_air_date.as_deref().filter(|d| !d.is_empty()))
    }

    /// Year extracted as the first 4 characters of the date field, if any.
    pub fn year_str(&self) -> &str {
        self.release_date_like()
            .and_then(|date| date.get(..4))
            .unwrap_or("")
    }

    /// TMDb identifier, from either id key the scraper uses.
    pub fn external_id(&self) -> Option<String> {
        self.id.or(self.tmdb_id).map(|id| id.to_string())
    }
}

/// Whether a resolved work is a movie or a TV series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Tv => write!(f, "tv"),
        }
    }
}

/// A resolved title: the TMDb identifier plus its media type.
///
/// Serializes as `{"id": "...", "type": "movie"|"tv"}`, the shape the cache
/// document's readers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}
