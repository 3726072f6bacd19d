pub mod error;
pub mod omdb;
pub mod traits;

pub use error::CatalogError;
pub use omdb::OmdbClient;
pub use traits::MovieCatalog;
pub use tokio_util::sync::CancellationToken;
