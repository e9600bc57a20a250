use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::errors::ApplicationError;

/// Configuration specification with environment override → default priority
pub struct ConfigSpec {
    env_provider: Arc<dyn EnvironmentProvider>,
    env_override: Option<String>,
    default_value: Option<String>,
    required: bool,
    min_length: Option<usize>,
    validator: Option<fn(&str) -> Result<(), String>>,
}

impl ConfigSpec {
    pub fn new(env_provider: Arc<dyn EnvironmentProvider>) -> Self {
        Self {
            env_provider,
            env_override: None,
            default_value: None,
            required: false,
            min_length: None,
            validator: None,
        }
    }

    pub fn env_override(mut self, name: &str) -> Self {
        self.env_override = Some(name.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn validator(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.validator = Some(f);
        self
    }

    fn setting_name(&self) -> &str {
        self.env_override.as_deref().unwrap_or("unknown_setting")
    }

    /// Resolve the value: environment first, then the default
    ///
    /// Returns None only for optional settings with no value anywhere.
    pub fn load(&self) -> Result<Option<String>, ApplicationError> {
        let from_env = self
            .env_override
            .as_ref()
            .and_then(|name| self.env_provider.get_var(name));

        let value = match from_env.or_else(|| self.default_value.clone()) {
            Some(value) => value,
            None if self.required => {
                return Err(ApplicationError::InvalidSetting {
                    setting_name: self.setting_name().to_string(),
                    reason: "Required setting has no value from any source".to_string(),
                });
            }
            None => return Ok(None),
        };

        self.validate_value(&value, self.setting_name())?;
        Ok(Some(value))
    }

    /// Like `load` but for settings that always resolve (required or defaulted)
    pub fn load_value(&self) -> Result<String, ApplicationError> {
        self.load()?.ok_or_else(|| ApplicationError::InvalidSetting {
            setting_name: self.setting_name().to_string(),
            reason: "Setting has no value".to_string(),
        })
    }

    /// Validate a setting value according to the ConfigSpec rules
    pub fn validate_value(&self, value: &str, setting_name: &str) -> Result<(), ApplicationError> {
        if let Some(min_len) = self.min_length {
            if value.len() < min_len {
                return Err(ApplicationError::InvalidSetting {
                    setting_name: setting_name.to_string(),
                    reason: format!("Value must be at least {} characters long", min_len),
                });
            }
        }

        if let Some(validator) = self.validator {
            validator(value).map_err(|reason| ApplicationError::InvalidSetting {
                setting_name: setting_name.to_string(),
                reason,
            })?;
        }

        Ok(())
    }
}

/// Parsing and validation helpers shared by settings
impl ConfigSpec {
    pub fn parse_port(value: &str, setting_name: &str) -> Result<u16, ApplicationError> {
        value.parse::<u16>().map_err(|e| ApplicationError::ParseError {
            setting_name: setting_name.to_string(),
            error: format!("Expected port number, got '{}': {}", value, e),
        })
    }

    pub fn validate_port_range(value: &str, min: u16, max: u16) -> Result<(), String> {
        let port = value
            .parse::<u32>()
            .map_err(|_| format!("Port must be a number, got '{}'", value))?;
        if port < min as u32 || port > max as u32 {
            return Err(format!("Port must be between {} and {}, got {}", min, max, port));
        }
        Ok(())
    }

    pub fn validate_host_address(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("Host address cannot be empty".to_string());
        }
        if value.parse::<std::net::IpAddr>().is_ok() || value == "localhost" {
            return Ok(());
        }
        if value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Ok(());
        }
        Err(format!("Invalid host address '{}'", value))
    }

    /// Accept absolute http(s) URLs without a trailing slash
    pub fn validate_http_url(value: &str) -> Result<(), String> {
        if !(value.starts_with("http://") || value.starts_with("https://")) {
            return Err(format!("URL must start with http:// or https://, got '{}'", value));
        }
        if value.ends_with('/') {
            return Err("URL must not end with '/'".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticEnvironment;

    fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvironmentProvider> {
        Arc::new(StaticEnvironment::empty().with_vars(vars))
    }

    #[test]
    fn test_env_value_overrides_default() {
        let spec = ConfigSpec::new(env(&[("PORT", "8080")]))
            .env_override("PORT")
            .default_value("3000");
        assert_eq!(spec.load().unwrap(), Some("8080".to_string()));
    }

    #[test]
    fn test_default_used_when_env_missing() {
        let spec = ConfigSpec::new(env(&[])).env_override("PORT").default_value("3000");
        assert_eq!(spec.load_value().unwrap(), "3000");
    }

    #[test]
    fn test_required_without_value_fails() {
        let spec = ConfigSpec::new(env(&[])).env_override("JWT_SECRET").required(true);
        match spec.load() {
            Err(ApplicationError::InvalidSetting { setting_name, .. }) => {
                assert_eq!(setting_name, "JWT_SECRET");
            }
            other => panic!("Expected InvalidSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_without_value_is_none() {
        let spec = ConfigSpec::new(env(&[])).env_override("GITHUB_CLIENT_ID");
        assert_eq!(spec.load().unwrap(), None);
    }

    #[test]
    fn test_validator_failure_reports_reason() {
        let spec = ConfigSpec::new(env(&[("FRONTEND_URL", "localhost:3000")]))
            .env_override("FRONTEND_URL")
            .validator(ConfigSpec::validate_http_url);
        match spec.load() {
            Err(ApplicationError::InvalidSetting { reason, .. }) => {
                assert!(reason.contains("http://"));
            }
            other => panic!("Expected InvalidSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_port_range_validation() {
        assert!(ConfigSpec::validate_port_range("8080", 1, 65535).is_ok());
        assert!(ConfigSpec::validate_port_range("0", 1, 65535).is_err());
        assert!(ConfigSpec::validate_port_range("70000", 1, 65535).is_err());
        assert!(ConfigSpec::validate_port_range("abc", 1, 65535).is_err());
    }

    #[test]
    fn test_host_validation() {
        assert!(ConfigSpec::validate_host_address("0.0.0.0").is_ok());
        assert!(ConfigSpec::validate_host_address("::1").is_ok());
        assert!(ConfigSpec::validate_host_address("api.example.com").is_ok());
        assert!(ConfigSpec::validate_host_address("").is_err());
        assert!(ConfigSpec::validate_host_address("bad host").is_err());
    }
}
