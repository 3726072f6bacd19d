use async_trait::async_trait;
use popcorn_config::{Config, ConfigError, CredentialStore, ProviderConfig};
use popcorn_models::{MovieDetail, SearchResultItem};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CatalogError;
use crate::omdb::api;
use crate::traits::MovieCatalog;

#[derive(Clone)]
pub struct OmdbClient {
    client: Arc<Client>,
    provider: ProviderConfig,
    api_key: String,
}

impl OmdbClient {
    pub fn new(provider: ProviderConfig, api_key: String) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(provider.timeout_seconds))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            provider,
            api_key,
        })
    }

    /// Build a client from on-disk configuration.
    ///
    /// Fails with `ConfigError::MissingApiKey` before any request can be made.
    pub fn from_config(config: &Config, credentials: &CredentialStore) -> Result<Self, ConfigError> {
        config.validate()?;
        let api_key = config.resolve_api_key(credentials)?;
        Self::new(config.provider.clone(), api_key)
            .map_err(|e| ConfigError::Invalid(format!("could not build HTTP client: {}", e)))
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// GET request for a single parameter (search text or exact id)
    pub fn build_request(&self, param: &str, value: &str) -> reqwest::RequestBuilder {
        self.client
            .get(&self.provider.base_url)
            .query(&[(self.provider.key_param.as_str(), self.api_key.as_str()), (param, value)])
            .header("Accept", "application/json")
    }

    async fn get_json(&self, param: &str, value: &str) -> Result<Value, CatalogError> {
        debug!("GET {} ({}={})", self.provider.base_url, param, value);

        let response = self.build_request(param, value).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(CatalogError::Transport(format!("provider returned {}", status)));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| CatalogError::Malformed(e.to_string()))
    }
}

/// Race `request` against the token; a fired token always wins.
async fn cancellable<T, F>(cancel: &CancellationToken, request: F) -> Result<T, CatalogError>
where
    F: Future<Output = Result<T, CatalogError>>,
{
    if cancel.is_cancelled() {
        return Err(CatalogError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CatalogError::Cancelled),
        result = request => result,
    }
}

#[async_trait]
impl MovieCatalog for OmdbClient {
    fn catalog_name(&self) -> &str {
        "omdb"
    }

    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResultItem>, CatalogError> {
        cancellable(cancel, async {
            let body = self.get_json(&self.provider.search_param, query).await?;
            api::parse_search_response(body, &self.provider)
        })
        .await
    }

    async fn fetch_detail(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError> {
        cancellable(cancel, async {
            let body = self.get_json(&self.provider.id_param, id).await?;
            api::parse_detail_response(body, id, &self.provider)
        })
        .await
    }
}
