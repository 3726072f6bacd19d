use serde::{Deserialize, Serialize};

/// One row of a title search.
///
/// Sourced fresh for every query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultItem {
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
}

/// Full metadata for a single selected title.
///
/// Numeric fields the provider reports as text ("148 min", "8.6", "N/A")
/// are parsed on the way in; anything that is not a finite number is `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
    /// Runtime as displayed by the provider, e.g. "148 min"
    pub runtime: String,
    pub runtime_minutes: Option<f64>,
    pub imdb_rating: Option<f64>,
    pub plot: String,
    pub released: String,
    pub actors: String,
    pub director: String,
    pub genre: String,
}

impl MovieDetail {
    /// True when the IMDb rating is strictly above `threshold`.
    ///
    /// A missing rating is never highly rated.
    pub fn is_rated_above(&self, threshold: f64) -> bool {
        self.imdb_rating.map(|r| r > threshold).unwrap_or(false)
    }
}

/// Parse a rating such as "8.6". "N/A" and other garbage yield `None`.
pub fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the first whitespace-separated token as a number ("148 min" -> 148).
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    raw.split_whitespace()
        .next()
        .and_then(parse_rating)
}
