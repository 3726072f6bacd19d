use popcorn_config::Config;
use popcorn_models::{WatchedEntry, WatchedSummary};
use popcorn_sources::MovieCatalog;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::detail::{DetailCompletion, DetailError, DetailLoader, DetailTicket};
use crate::flight::Applied;
use crate::search::{SearchCompletion, SearchController, SearchTicket};
use crate::storage::KeyValueStore;
use crate::watched::{AddOutcome, StoreError, WatchedStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Detail(#[from] DetailError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything one user sees: search box, detail pane and watched list.
///
/// The `begin_*`/`finish_*` pairs let an event loop run requests
/// concurrently with input; the async helpers do both halves in sequence.
pub struct Session<S: KeyValueStore> {
    catalog: Arc<dyn MovieCatalog>,
    search: SearchController,
    detail: DetailLoader,
    watched: WatchedStore<S>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(catalog: Arc<dyn MovieCatalog>, config: &Config, watched: WatchedStore<S>) -> Self {
        Self {
            catalog,
            search: SearchController::new(config),
            detail: DetailLoader::new(config),
            watched,
        }
    }

    pub fn catalog(&self) -> Arc<dyn MovieCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn detail(&self) -> &DetailLoader {
        &self.detail
    }

    pub fn watched(&self) -> &WatchedStore<S> {
        &self.watched
    }

    pub fn summary(&self) -> WatchedSummary {
        self.watched.summary()
    }

    pub fn begin_query(&mut self, text: impl Into<String>) -> Option<SearchTicket> {
        self.search.on_query_change(text)
    }

    pub fn finish_query(&mut self, completion: SearchCompletion) -> Applied {
        self.search.apply(completion)
    }

    pub async fn set_query(&mut self, text: impl Into<String>) -> Applied {
        self.search.search(self.catalog.as_ref(), text).await
    }

    /// Empty the search box (the "focus search" shortcut does this)
    pub fn clear_query(&mut self) {
        self.search.on_query_change(String::new());
    }

    pub fn begin_select(&mut self, id: impl Into<String>) -> Option<DetailTicket> {
        self.detail.select(Some(id.into()))
    }

    pub fn finish_select(&mut self, completion: DetailCompletion) -> Applied {
        self.detail.apply(completion)
    }

    pub async fn select_movie(&mut self, id: impl Into<String>) -> Applied {
        self.detail.load(self.catalog.as_ref(), id).await
    }

    pub fn close_movie(&mut self) {
        self.detail.close();
    }

    pub fn rate(&mut self, rating: u8) -> Result<(), DetailError> {
        self.detail.set_pending_rating(rating)
    }

    /// Rating previously given to the open movie, if it was watched
    pub fn watched_rating(&self) -> Option<u8> {
        self.detail.watched_rating(&self.watched)
    }

    /// Confirm the pending rating, store the entry and close the detail
    /// pane. The pane stays open if anything fails.
    pub fn add_watched(&mut self) -> Result<WatchedEntry, SessionError> {
        let entry = self.detail.confirm(&self.watched)?;
        match self.watched.add(entry.clone())? {
            AddOutcome::Added => {
                info!("Rated {} ({}) {}/10", entry.title, entry.id, entry.user_rating);
                self.detail.close();
                Ok(entry)
            }
            AddOutcome::AlreadyWatched => Err(DetailError::AlreadyWatched(entry.id).into()),
        }
    }

    pub fn delete_watched(&mut self, id: &str) -> Result<bool, StoreError> {
        self.watched.remove(id)
    }

    /// Cancel everything outstanding
    pub fn shutdown(&mut self) {
        self.search.shutdown();
        self.detail.close();
    }
}
