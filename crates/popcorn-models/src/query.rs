use serde::{Deserialize, Serialize};
use crate::movie::SearchResultItem;

/// State of the current search query cycle.
///
/// Only the search controller mutates this; everything else reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryState {
    pub query_text: String,
    pub results: Vec<SearchResultItem>,
    pub is_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of results currently shown
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Results are shown only when nothing is loading and no error is set
    pub fn shows_results(&self) -> bool {
        !self.is_loading && self.error_message.is_none()
    }
}
