use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::movie::parse_rating;

/// A movie the user has rated. Created once, never edited; only deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedEntry {
    pub id: String, // Dedup key (provider id, e.g. "tt0816692")
    pub title: String,
    pub poster_url: String,
    pub year: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub imdb_rating: Option<f64>,
    pub user_rating: u8, // 1-10
    #[serde(default, deserialize_with = "lenient_number")]
    pub runtime_minutes: Option<f64>,
    /// How many times the pending rating changed before it was confirmed
    pub rating_revision_count: u32,
    /// Older payloads lack it; they get the load time
    #[serde(default = "Utc::now")]
    pub date_added: DateTime<Utc>,
}

/// Numbers pass through, numeric strings are parsed, anything else
/// ("N/A", null, objects) becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_rating(&s),
        _ => None,
    })
}

/// Aggregates over the watched list. Always recomputed, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct WatchedSummary {
    pub count: usize,
    pub average_imdb_rating: f64,
    pub average_user_rating: f64,
    pub average_runtime_minutes: f64,
}

/// Mean of the finite values in `values`; 0 when there are none.
pub fn average<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Each average skips entries whose own field is missing or not finite.
pub fn summarize(entries: &[WatchedEntry]) -> WatchedSummary {
    WatchedSummary {
        count: entries.len(),
        average_imdb_rating: average(entries.iter().filter_map(|e| e.imdb_rating)),
        average_user_rating: average(entries.iter().map(|e| f64::from(e.user_rating))),
        average_runtime_minutes: average(entries.iter().filter_map(|e| e.runtime_minutes)),
    }
}
