pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{ApiKeySource, Config, ConfigError, DetailConfig, LoggingConfig, Messages, ProviderConfig, SearchConfig, API_KEY_ENV};
pub use credentials::CredentialStore;
pub use paths::{PathManager, base_path_override};
