// Title matching against TMDb search results.
//
// Candidate order is the provider's relevance ranking, so ties among exact
// matches and the fallback choice both defer to it.

use crate::models::{CandidateItem, MediaType};

/// Normalize a title for comparison and cache keying. Idempotent.
pub fn normalize(title: &str) -> String {
    title.to_lowercase()
}

/// Outcome of matching a query against a candidate list.
///
/// A `Fallback` is the provider's top-ranked result returned when nothing
/// matched exactly; callers that care about precision must treat it
/// differently from `Exact` rather than collapsing both into "found".
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Exact(CandidateItem),
    Fallback(CandidateItem),
    NoMatch,
}

impl MatchOutcome {
    pub fn into_candidate(self) -> Option<CandidateItem> {
        match self {
            MatchOutcome::Exact(item) | MatchOutcome::Fallback(item) => Some(item),
            MatchOutcome::NoMatch => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, MatchOutcome::Fallback(_))
    }
}

/// Pick the best candidate for `query`.
///
/// A candidate matches exactly when its normalized display name equals the
/// normalized query and, if a year is given, the first four characters of its
/// release-date-like field equal the year. The first exact match in candidate
/// order wins. With no exact match, the first candidate is returned as a
/// fallback: a plausible answer beats none at all.
pub fn select_candidate(
    query: &str,
    year: Option<i32>,
    candidates: &[CandidateItem],
) -> MatchOutcome {
    let query_norm = normalize(query);

    for item in candidates {
        let title_matches = normalize(item.display_name()) == query_norm;
        let year_matches = match year {
            Some(y) => y.to_string() == item.year_str(),
            None => true,
        };
        if title_matches && year_matches {
            return MatchOutcome::Exact(item.clone());
        }
    }

    match candidates.first() {
        Some(first) => MatchOutcome::Fallback(first.clone()),
        None => MatchOutcome::NoMatch,
    }
}

/// Infer the media type from the shape of the raw record.
///
/// TMDb labels series with `name`/first-air-date fields and movies with
/// `title`/release-date fields; the presence of the series-style fields is
/// the only type signal the scraper output carries.
pub fn classify(candidate: &CandidateItem) -> MediaType {
    if candidate.name.is_some() || candidate.first_air_date.is_some() {
        MediaType::Tv
    } else {
        MediaType::Movie
    }
}
