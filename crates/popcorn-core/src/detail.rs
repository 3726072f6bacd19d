use chrono::Utc;
use popcorn_config::Config;
use popcorn_models::{MovieDetail, WatchedEntry};
use popcorn_sources::{CatalogError, MovieCatalog};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::flight::{Applied, FlightTracker};
use crate::storage::KeyValueStore;
use crate::watched::WatchedStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetailError {
    #[error("no movie is selected")]
    NothingSelected,

    #[error("movie details have not loaded yet")]
    NotLoaded,

    #[error("pick a rating first")]
    NoRating,

    #[error("rating must be between 1 and 10, got {0}")]
    InvalidRating(u8),

    #[error("{0} is already in the watched list")]
    AlreadyWatched(String),
}

/// A detail fetch the loader has decided to issue.
#[derive(Debug)]
pub struct DetailTicket {
    epoch: u64,
    id: String,
    cancel: CancellationToken,
}

impl DetailTicket {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn run(self, catalog: &dyn MovieCatalog) -> DetailCompletion {
        let result = catalog.fetch_detail(&self.id, &self.cancel).await;
        DetailCompletion {
            epoch: self.epoch,
            id: self.id,
            cancel: self.cancel,
            result,
        }
    }
}

#[derive(Debug)]
pub struct DetailCompletion {
    epoch: u64,
    id: String,
    cancel: CancellationToken,
    result: Result<MovieDetail, CatalogError>,
}

impl DetailCompletion {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn result(&self) -> &Result<MovieDetail, CatalogError> {
        &self.result
    }
}

/// Full metadata for the selected title plus the user's pending rating.
pub struct DetailLoader {
    selected_id: Option<String>,
    detail: Option<MovieDetail>,
    is_loading: bool,
    error_message: Option<String>,
    pending_rating: Option<u8>,
    rating_revisions: u32,
    highly_rated_threshold: f64,
    failure_message: String,
    flight: FlightTracker,
}

impl DetailLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            selected_id: None,
            detail: None,
            is_loading: false,
            error_message: None,
            pending_rating: None,
            rating_revisions: 0,
            highly_rated_threshold: config.detail.highly_rated_threshold,
            failure_message: config.messages.detail_failed.clone(),
            flight: FlightTracker::default(),
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn detail(&self) -> Option<&MovieDetail> {
        self.detail.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn pending_rating(&self) -> Option<u8> {
        self.pending_rating
    }

    pub fn rating_revisions(&self) -> u32 {
        self.rating_revisions
    }

    pub fn has_in_flight(&self) -> bool {
        self.flight.has_in_flight()
    }

    /// Derived from the loaded detail on every call
    pub fn is_highly_rated(&self) -> bool {
        self.detail
            .as_ref()
            .map(|d| d.is_rated_above(self.highly_rated_threshold))
            .unwrap_or(false)
    }

    /// Change the selection. Returns a ticket when a fetch is needed.
    ///
    /// Any in-flight fetch is cancelled and everything tied to the old
    /// selection is dropped. Re-selecting the current id does nothing.
    pub fn select(&mut self, id: Option<String>) -> Option<DetailTicket> {
        if id.is_some() && id == self.selected_id {
            debug!("{:?} already selected", id);
            return None;
        }

        self.detail = None;
        self.error_message = None;
        self.pending_rating = None;
        self.rating_revisions = 0;
        self.selected_id = id.clone();

        let Some(id) = id else {
            self.flight.supersede();
            self.is_loading = false;
            return None;
        };

        let (epoch, cancel) = self.flight.begin();
        self.is_loading = true;
        debug!("Loading details #{} for {}", epoch, id);

        Some(DetailTicket { epoch, id, cancel })
    }

    /// Deselect and drop the current detail
    pub fn close(&mut self) {
        self.select(None);
    }

    pub fn apply(&mut self, completion: DetailCompletion) -> Applied {
        if !self.flight.is_current(completion.epoch, &completion.cancel) {
            debug!("Discarding stale details for {}", completion.id);
            return Applied::Discarded;
        }

        match completion.result {
            Ok(detail) => {
                self.detail = Some(detail);
                self.error_message = None;
            }
            Err(CatalogError::Cancelled) => {
                warn!("Catalog reported cancellation for live detail fetch {}", completion.id);
            }
            Err(e) => {
                warn!("Loading details for {} failed: {}", completion.id, e);
                self.error_message = Some(self.failure_message.clone());
            }
        }

        self.flight.settle();
        self.is_loading = false;
        Applied::Updated
    }

    /// Select `id` and wait for its details in one step.
    pub async fn load(&mut self, catalog: &dyn MovieCatalog, id: impl Into<String>) -> Applied {
        match self.select(Some(id.into())) {
            Some(ticket) => {
                let completion = ticket.run(catalog).await;
                self.apply(completion)
            }
            None => Applied::Updated,
        }
    }

    /// Record the user's pending choice. Picking the same value again is
    /// not a revision.
    pub fn set_pending_rating(&mut self, rating: u8) -> Result<(), DetailError> {
        if !(1..=10).contains(&rating) {
            return Err(DetailError::InvalidRating(rating));
        }
        if self.selected_id.is_none() {
            return Err(DetailError::NothingSelected);
        }
        if self.pending_rating != Some(rating) {
            self.pending_rating = Some(rating);
            self.rating_revisions += 1;
        }
        Ok(())
    }

    /// The rating the user already gave the selected title, if any
    pub fn watched_rating<S: KeyValueStore>(&self, store: &WatchedStore<S>) -> Option<u8> {
        self.selected_id
            .as_deref()
            .and_then(|id| store.get(id))
            .map(|entry| entry.user_rating)
    }

    /// Build the entry to add for the current selection and rating.
    pub fn confirm<S: KeyValueStore>(&self, store: &WatchedStore<S>) -> Result<WatchedEntry, DetailError> {
        let id = self.selected_id.as_deref().ok_or(DetailError::NothingSelected)?;
        let detail = self.detail.as_ref().ok_or(DetailError::NotLoaded)?;
        let user_rating = self.pending_rating.ok_or(DetailError::NoRating)?;
        if store.contains(id) {
            return Err(DetailError::AlreadyWatched(id.to_string()));
        }

        Ok(WatchedEntry {
            id: id.to_string(),
            title: detail.title.clone(),
            poster_url: detail.poster_url.clone(),
            year: detail.year.clone(),
            imdb_rating: detail.imdb_rating,
            user_rating,
            runtime_minutes: detail.runtime_minutes,
            rating_revision_count: self.rating_revisions,
            date_added: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests;
