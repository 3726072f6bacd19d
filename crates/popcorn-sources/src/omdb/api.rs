use popcorn_config::ProviderConfig;
use popcorn_models::{parse_leading_number, parse_rating, MovieDetail, SearchResultItem};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::CatalogError;

/// OMDb uses this literal for every field it has no data for
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: String,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchPage {
    #[serde(rename = "Search")]
    search: Vec<OmdbSearchItem>,
}

#[derive(Debug, Deserialize)]
struct OmdbDetail {
    #[serde(rename = "imdbID", default)]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster", default)]
    poster: String,
    #[serde(rename = "Runtime", default)]
    runtime: String,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: String,
    #[serde(rename = "Plot", default)]
    plot: String,
    #[serde(rename = "Released", default)]
    released: String,
    #[serde(rename = "Actors", default)]
    actors: String,
    #[serde(rename = "Director", default)]
    director: String,
    #[serde(rename = "Genre", default)]
    genre: String,
}

fn poster_url(raw: String) -> String {
    if raw == NOT_AVAILABLE {
        String::new()
    } else {
        raw
    }
}

/// Map the provider's logical-failure sentinel to `NoResults`.
///
/// The sentinel arrives with a 2xx status, so HTTP status alone can't be
/// trusted to mean "found".
pub fn check_sentinel(body: &Value, provider: &ProviderConfig) -> Result<(), CatalogError> {
    let object = body
        .as_object()
        .ok_or_else(|| CatalogError::Malformed("expected a JSON object".to_string()))?;

    let flag = object.get(&provider.response_field).and_then(Value::as_str);
    if flag == Some(provider.failure_value.as_str()) {
        let message = object
            .get(&provider.error_field)
            .and_then(Value::as_str)
            .unwrap_or("not found")
            .to_string();
        return Err(CatalogError::NoResults(message));
    }
    Ok(())
}

pub fn parse_search_response(
    body: Value,
    provider: &ProviderConfig,
) -> Result<Vec<SearchResultItem>, CatalogError> {
    check_sentinel(&body, provider)?;

    let page: OmdbSearchPage = serde_json::from_value(body)
        .map_err(|e| CatalogError::Malformed(e.to_string()))?;

    // The provider repeats ids now and then; first occurrence wins
    let mut seen = HashSet::new();
    let items: Vec<SearchResultItem> = page
        .search
        .into_iter()
        .filter(|item| seen.insert(item.imdb_id.clone()))
        .map(|item| SearchResultItem {
            id: item.imdb_id,
            title: item.title,
            year: item.year,
            poster_url: poster_url(item.poster),
        })
        .collect();

    if items.is_empty() {
        return Err(CatalogError::NoResults("empty result set".to_string()));
    }
    Ok(items)
}

pub fn parse_detail_response(
    body: Value,
    requested_id: &str,
    provider: &ProviderConfig,
) -> Result<MovieDetail, CatalogError> {
    check_sentinel(&body, provider)?;

    let raw: OmdbDetail = serde_json::from_value(body)
        .map_err(|e| CatalogError::Malformed(e.to_string()))?;

    let id = if raw.imdb_id.is_empty() {
        requested_id.to_string()
    } else {
        raw.imdb_id
    };

    Ok(MovieDetail {
        id,
        title: raw.title,
        year: raw.year,
        poster_url: poster_url(raw.poster),
        runtime_minutes: parse_leading_number(&raw.runtime),
        runtime: raw.runtime,
        imdb_rating: parse_rating(&raw.imdb_rating),
        plot: raw.plot,
        released: raw.released,
        actors: raw.actors,
        director: raw.director,
        genre: raw.genre,
    })
}
