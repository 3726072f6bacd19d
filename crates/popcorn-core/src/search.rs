use popcorn_config::Config;
use popcorn_models::{QueryState, SearchResultItem};
use popcorn_sources::{CatalogError, MovieCatalog};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::flight::{Applied, FlightTracker};

/// A search the controller has decided to issue.
///
/// Run it against a catalog and hand the completion back to
/// [`SearchController::apply`].
#[derive(Debug)]
pub struct SearchTicket {
    epoch: u64,
    query: String,
    cancel: CancellationToken,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn run(self, catalog: &dyn MovieCatalog) -> SearchCompletion {
        let result = catalog.search(&self.query, &self.cancel).await;
        SearchCompletion {
            epoch: self.epoch,
            query: self.query,
            cancel: self.cancel,
            result,
        }
    }
}

#[derive(Debug)]
pub struct SearchCompletion {
    epoch: u64,
    query: String,
    cancel: CancellationToken,
    result: Result<Vec<SearchResultItem>, CatalogError>,
}

impl SearchCompletion {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn result(&self) -> &Result<Vec<SearchResultItem>, CatalogError> {
        &self.result
    }
}

/// Owns the query text and the {results, loading, error} state derived
/// from it.
pub struct SearchController {
    state: QueryState,
    min_query_len: usize,
    no_results_message: String,
    failure_message: String,
    flight: FlightTracker,
}

impl SearchController {
    pub fn new(config: &Config) -> Self {
        Self {
            state: QueryState::new(),
            min_query_len: config.search.min_query_len,
            no_results_message: config.messages.no_results.clone(),
            failure_message: config.messages.search_failed.clone(),
            flight: FlightTracker::default(),
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn query(&self) -> &str {
        &self.state.query_text
    }

    pub fn results(&self) -> &[SearchResultItem] {
        &self.state.results
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.state.error_message.as_deref()
    }

    pub fn has_in_flight(&self) -> bool {
        self.flight.has_in_flight()
    }

    /// Start a new query cycle for `text`.
    ///
    /// Whatever was outstanding is cancelled first. Short queries clear
    /// the state and return no ticket.
    pub fn on_query_change(&mut self, text: impl Into<String>) -> Option<SearchTicket> {
        let text = text.into();
        self.state.query_text = text.clone();
        self.state.error_message = None;

        if text.chars().count() < self.min_query_len {
            self.flight.supersede();
            self.state.results.clear();
            self.state.is_loading = false;
            debug!("Query {:?} below {} characters, not searching", text, self.min_query_len);
            return None;
        }

        let (epoch, cancel) = self.flight.begin();
        self.state.is_loading = true;
        debug!("Starting search #{} for {:?}", epoch, text);

        Some(SearchTicket {
            epoch,
            query: text,
            cancel,
        })
    }

    /// Fold a finished request into the state, unless it was superseded.
    ///
    /// On transport or parse failure the previous results stay visible.
    pub fn apply(&mut self, completion: SearchCompletion) -> Applied {
        if !self.flight.is_current(completion.epoch, &completion.cancel) {
            debug!("Discarding stale search result for {:?}", completion.query);
            return Applied::Discarded;
        }

        match completion.result {
            Ok(items) => {
                debug!("Search for {:?} returned {} items", completion.query, items.len());
                self.state.results = items;
                self.state.error_message = None;
            }
            Err(CatalogError::Cancelled) => {
                // Not ours to show; just stop the spinner
                warn!("Catalog reported cancellation for a live search {:?}", completion.query);
            }
            Err(CatalogError::NoResults(reason)) => {
                debug!("No results for {:?}: {}", completion.query, reason);
                self.state.results.clear();
                self.state.error_message = Some(self.no_results_message.clone());
            }
            Err(e) => {
                warn!("Search for {:?} failed: {}", completion.query, e);
                self.state.error_message = Some(self.failure_message.clone());
            }
        }

        self.flight.settle();
        self.state.is_loading = false;
        Applied::Updated
    }

    /// Change the query and wait for its outcome in one step.
    pub async fn search(&mut self, catalog: &dyn MovieCatalog, text: impl Into<String>) -> Applied {
        match self.on_query_change(text) {
            Some(ticket) => {
                let completion = ticket.run(catalog).await;
                self.apply(completion)
            }
            None => Applied::Updated,
        }
    }

    /// Cancel anything outstanding; later completions are discarded.
    pub fn shutdown(&mut self) {
        self.flight.supersede();
        self.state.is_loading = false;
    }
}
