mod bootstrap_settings;
mod config_spec;
mod database;
mod env_provider;
mod errors;
mod logging;
mod oauth_settings;
mod secret_config;
mod secret_manager;

pub use bootstrap_settings::{BootstrapSettings, StateBackend};
pub use config_spec::ConfigSpec;
pub use database::{init_database, migrate_database};
pub use env_provider::{EnvironmentProvider, StaticEnvironment, SystemEnvironment};
pub use errors::ApplicationError;
pub use logging::{LoggingConfig, LoggingError, init_logging};
pub use oauth_settings::{GithubSettings, OAuthSettings, WechatSettings};
pub use secret_config::{SecretConfig, SecretType};
pub use secret_manager::{SecretError, SecretManager};
