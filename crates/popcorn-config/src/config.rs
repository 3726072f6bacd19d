use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::credentials::CredentialStore;

/// Environment variable that overrides every stored access key
pub const API_KEY_ENV: &str = "OMDB_API_KEY";

const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no OMDb access key configured: set OMDB_API_KEY or run `popcorn config set-key`")]
    MissingApiKey,

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub detail: DetailConfig,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Provider HTTP contract. Field names live here rather than in the
/// client so a compatible mirror can be pointed at without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Discouraged: prefer credentials.toml or the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_key_param")]
    pub key_param: String,
    #[serde(default = "default_search_param")]
    pub search_param: String,
    #[serde(default = "default_id_param")]
    pub id_param: String,
    /// Payload field carrying the logical success flag
    #[serde(default = "default_response_field")]
    pub response_field: String,
    /// Value of `response_field` that means "nothing found"
    #[serde(default = "default_failure_value")]
    pub failure_value: String,
    #[serde(default = "default_error_field")]
    pub error_field: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailConfig {
    #[serde(default = "default_highly_rated_threshold")]
    pub highly_rated_threshold: f64,
}

/// User-visible strings, one per failing operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    #[serde(default = "default_no_results")]
    pub no_results: String,
    #[serde(default = "default_search_failed")]
    pub search_failed: String,
    #[serde(default = "default_detail_failed")]
    pub detail_failed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when neither -v nor RUST_LOG is given
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write a daily rolling log file under the log directory
    #[serde(default)]
    pub file: bool,
}

fn default_base_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

fn default_key_param() -> String {
    "apikey".to_string()
}

fn default_search_param() -> String {
    "s".to_string()
}

fn default_id_param() -> String {
    "i".to_string()
}

fn default_response_field() -> String {
    "Response".to_string()
}

fn default_failure_value() -> String {
    "False".to_string()
}

fn default_error_field() -> String {
    "Error".to_string()
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_min_query_len() -> usize {
    3
}

fn default_highly_rated_threshold() -> f64 {
    8.0
}

fn default_no_results() -> String {
    "!جستجوی شما نتیجه‌ای نداشت".to_string()
}

fn default_search_failed() -> String {
    "Something went wrong with fetching movies!".to_string()
}

fn default_detail_failed() -> String {
    "Something went wrong with fetching movie details!".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            key_param: default_key_param(),
            search_param: default_search_param(),
            id_param: default_id_param(),
            response_field: default_response_field(),
            failure_value: default_failure_value(),
            error_field: default_error_field(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: default_min_query_len(),
        }
    }
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            highly_rated_threshold: default_highly_rated_threshold(),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            no_results: default_no_results(),
            search_failed: default_search_failed(),
            detail_failed: default_detail_failed(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A missing config file is not an error; every setting has a default
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.provider.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "provider.base_url must be an http(s) URL, got {:?}",
                self.provider.base_url
            )));
        }
        if self.provider.response_field.is_empty() {
            return Err(ConfigError::Invalid("provider.response_field cannot be empty".to_string()));
        }
        if self.search.min_query_len == 0 {
            return Err(ConfigError::Invalid("search.min_query_len must be at least 1".to_string()));
        }
        let threshold = self.detail.highly_rated_threshold;
        if !(0.0..=10.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "detail.highly_rated_threshold must be between 0 and 10, got {}",
                threshold
            )));
        }
        Ok(())
    }

    /// Access key lookup order: environment, credentials file, config file.
    pub fn resolve_api_key(&self, credentials: &CredentialStore) -> Result<String, ConfigError> {
        self.resolve_api_key_with(std::env::var(API_KEY_ENV).ok(), credentials)
    }

    /// The key `resolve_api_key` would use, and where it came from
    pub fn api_key_with_source(&self, credentials: &CredentialStore) -> Option<(ApiKeySource, String)> {
        self.api_key_with_source_from(std::env::var(API_KEY_ENV).ok(), credentials)
    }

    fn resolve_api_key_with(
        &self,
        from_env: Option<String>,
        credentials: &CredentialStore,
    ) -> Result<String, ConfigError> {
        self.api_key_with_source_from(from_env, credentials)
            .map(|(_, key)| key)
            .ok_or(ConfigError::MissingApiKey)
    }

    fn api_key_with_source_from(
        &self,
        from_env: Option<String>,
        credentials: &CredentialStore,
    ) -> Option<(ApiKeySource, String)> {
        [
            (ApiKeySource::Environment, from_env),
            (ApiKeySource::Credentials, credentials.get_omdb_api_key().cloned()),
            (ApiKeySource::ConfigFile, self.provider.api_key.clone()),
        ]
        .into_iter()
        .filter_map(|(source, key)| key.map(|key| (source, key.trim().to_string())))
        .find(|(_, key)| !key.is_empty() && key != PLACEHOLDER_API_KEY)
    }
}

/// Which layer supplied the access key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    Credentials,
    ConfigFile,
}

impl ApiKeySource {
    pub fn label(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => API_KEY_ENV,
            ApiKeySource::Credentials => "credentials.toml",
            ApiKeySource::ConfigFile => "config.toml",
        }
    }
}
