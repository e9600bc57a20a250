use std::fmt;
use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ApplicationError;

/// Backing store for short-lived OAuth state entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBackend {
    /// Shared table, safe with several worker processes
    Database,
    /// Process-local map, development only
    Memory,
}

/// Bootstrap settings for infrastructure configuration
pub struct BootstrapSettings {
    database_url: String,
    server_host: String,
    server_port: u16,
    frontend_url: String,
    state_backend: StateBackend,
}

impl BootstrapSettings {
    /// Load bootstrap settings through the given environment provider
    pub fn from_env_provider(env_provider: Arc<dyn EnvironmentProvider>) -> Result<Self, ApplicationError> {
        let database_url = ConfigSpec::new(env_provider.clone())
            .env_override("DATABASE_URL")
            .default_value("sqlite://healthtrack.db?mode=rwc")
            .min_length(1)
            .load_value()?;

        let server_host = ConfigSpec::new(env_provider.clone())
            .env_override("HOST")
            .default_value("0.0.0.0")
            .validator(ConfigSpec::validate_host_address)
            .load_value()?;

        let port_value = ConfigSpec::new(env_provider.clone())
            .env_override("PORT")
            .default_value("3000")
            .validator(|value| ConfigSpec::validate_port_range(value, 1, 65535))
            .load_value()?;
        let server_port = ConfigSpec::parse_port(&port_value, "PORT")?;

        let frontend_url = ConfigSpec::new(env_provider.clone())
            .env_override("FRONTEND_URL")
            .default_value("http://localhost:3000")
            .validator(ConfigSpec::validate_http_url)
            .load_value()?;

        let state_backend = ConfigSpec::new(env_provider)
            .env_override("STATE_BACKEND")
            .default_value("database")
            .validator(|value| match value {
                "database" | "memory" => Ok(()),
                other => Err(format!("Expected 'database' or 'memory', got '{}'", other)),
            })
            .load_value()?;
        let state_backend = if state_backend == "memory" {
            StateBackend::Memory
        } else {
            StateBackend::Database
        };

        Ok(Self {
            database_url,
            server_host,
            server_port,
            frontend_url,
            state_backend,
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, ApplicationError> {
        use crate::config::SystemEnvironment;
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn server_host(&self) -> &str {
        &self.server_host
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub fn state_backend(&self) -> StateBackend {
        self.state_backend
    }
}

impl fmt::Debug for BootstrapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapSettings")
            .field("database_url", &self.database_url)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("frontend_url", &self.frontend_url)
            .field("state_backend", &self.state_backend)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticEnvironment;

    fn create_test_env(vars: &[(&str, &str)]) -> Arc<dyn EnvironmentProvider> {
        Arc::new(StaticEnvironment::empty().with_vars(vars))
    }

    #[test]
    fn test_bootstrap_settings_with_all_vars() {
        let settings = BootstrapSettings::from_env_provider(create_test_env(&[
            ("DATABASE_URL", "sqlite://test.db"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("FRONTEND_URL", "https://health.example.com"),
            ("STATE_BACKEND", "memory"),
        ]))
        .unwrap();

        assert_eq!(settings.database_url(), "sqlite://test.db");
        assert_eq!(settings.server_address(), "127.0.0.1:8080");
        assert_eq!(settings.frontend_url(), "https://health.example.com");
        assert_eq!(settings.state_backend(), StateBackend::Memory);
    }

    #[test]
    fn test_bootstrap_settings_with_defaults() {
        let settings = BootstrapSettings::from_env_provider(create_test_env(&[])).unwrap();

        assert_eq!(settings.database_url(), "sqlite://healthtrack.db?mode=rwc");
        assert_eq!(settings.server_host(), "0.0.0.0");
        assert_eq!(settings.server_port(), 3000);
        assert_eq!(settings.state_backend(), StateBackend::Database);
    }

    #[test]
    fn test_empty_database_url_fails_validation() {
        let result = BootstrapSettings::from_env_provider(create_test_env(&[("DATABASE_URL", "")]));

        match result {
            Err(ApplicationError::InvalidSetting { setting_name, reason }) => {
                assert_eq!(setting_name, "DATABASE_URL");
                assert!(reason.contains("at least 1 characters"));
            }
            other => panic!("Expected InvalidSetting for DATABASE_URL, got: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_port_fails() {
        let result = BootstrapSettings::from_env_provider(create_test_env(&[("PORT", "0")]));
        assert!(matches!(result, Err(ApplicationError::InvalidSetting { .. })));
    }

    #[test]
    fn test_unknown_state_backend_fails() {
        let result = BootstrapSettings::from_env_provider(create_test_env(&[("STATE_BACKEND", "redis")]));
        match result {
            Err(ApplicationError::InvalidSetting { setting_name, .. }) => {
                assert_eq!(setting_name, "STATE_BACKEND");
            }
            other => panic!("Expected InvalidSetting, got: {:?}", other),
        }
    }
}
