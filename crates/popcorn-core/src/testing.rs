//! In-process catalog with canned responses and release gates.

use async_trait::async_trait;
use popcorn_models::{MovieDetail, SearchResultItem};
use popcorn_sources::{CatalogError, MovieCatalog};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub(crate) struct FakeCatalog {
    searches: HashMap<String, Result<Vec<SearchResultItem>, CatalogError>>,
    details: HashMap<String, Result<MovieDetail, CatalogError>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    honor_cancel: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub(crate) fn new() -> Self {
        Self {
            searches: HashMap::new(),
            details: HashMap::new(),
            gates: Mutex::new(HashMap::new()),
            honor_cancel: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_search(
        mut self,
        query: &str,
        response: Result<Vec<SearchResultItem>, CatalogError>,
    ) -> Self {
        self.searches.insert(query.to_string(), response);
        self
    }

    pub(crate) fn with_detail(mut self, id: &str, response: Result<MovieDetail, CatalogError>) -> Self {
        self.details.insert(id.to_string(), response);
        self
    }

    /// Answer even after the token fires, like a transport that can't abort
    pub(crate) fn ignoring_cancellation(mut self) -> Self {
        self.honor_cancel = false;
        self
    }

    /// Hold the response for `key` ("search:<q>" or "detail:<id>") until
    /// the returned sender fires.
    pub(crate) fn gate(&self, key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key.to_string(), rx);
        tx
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond<T: Clone>(
        &self,
        key: String,
        canned: Option<&Result<T, CatalogError>>,
        cancel: &CancellationToken,
    ) -> Result<T, CatalogError> {
        self.calls.lock().unwrap().push(key.clone());
        let gate = self.gates.lock().unwrap().remove(&key);

        if let Some(gate) = gate {
            if self.honor_cancel {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
                    _ = gate => {}
                }
            } else {
                let _ = gate.await;
            }
        }

        if self.honor_cancel && cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        canned
            .cloned()
            .unwrap_or_else(|| Err(CatalogError::Transport(format!("no canned response for {}", key))))
    }
}

#[async_trait]
impl MovieCatalog for FakeCatalog {
    fn catalog_name(&self) -> &str {
        "fake"
    }

    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResultItem>, CatalogError> {
        self.respond(format!("search:{}", query), self.searches.get(query), cancel)
            .await
    }

    async fn fetch_detail(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError> {
        self.respond(format!("detail:{}", id), self.details.get(id), cancel)
            .await
    }
}

pub(crate) fn item(id: &str, title: &str) -> SearchResultItem {
    SearchResultItem {
        id: id.to_string(),
        title: title.to_string(),
        year: "2014".to_string(),
        poster_url: format!("https://img.example/{}.jpg", id),
    }
}

pub(crate) fn detail(id: &str, title: &str, rating: Option<f64>) -> MovieDetail {
    MovieDetail {
        id: id.to_string(),
        title: title.to_string(),
        year: "2014".to_string(),
        poster_url: format!("https://img.example/{}.jpg", id),
        runtime: "169 min".to_string(),
        runtime_minutes: Some(169.0),
        imdb_rating: rating,
        plot: "A team of explorers travel through a wormhole.".to_string(),
        released: "07 Nov 2014".to_string(),
        actors: "Matthew McConaughey, Anne Hathaway".to_string(),
        director: "Christopher Nolan".to_string(),
        genre: "Adventure, Drama, Sci-Fi".to_string(),
    }
}
