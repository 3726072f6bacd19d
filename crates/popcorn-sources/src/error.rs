use thiserror::Error;

/// Failure of a single catalog request.
///
/// `Cancelled` is the caller's own doing and must never reach the user;
/// the other kinds collapse into one message per operation upstream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("request cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no results: {0}")]
    NoResults(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl CatalogError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CatalogError::Malformed(err.to_string())
        } else {
            CatalogError::Transport(err.to_string())
        }
    }
}
