use async_trait::async_trait;
use popcorn_models::{MovieDetail, SearchResultItem};
use tokio_util::sync::CancellationToken;

use crate::error::CatalogError;

/// A remote movie database.
///
/// Implementations must return `CatalogError::Cancelled` as soon as the
/// token fires, whatever state the underlying request is in.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    fn catalog_name(&self) -> &str;

    /// Free-text title search
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResultItem>, CatalogError>;

    /// Exact lookup by provider id
    async fn fetch_detail(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError>;
}
