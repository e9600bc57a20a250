use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{EnvironmentProvider, SecretConfig, SecretType, SystemEnvironment};

/// Secret loading failures
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Required secret '{secret_name}' is missing")]
    Missing { secret_name: String },

    #[error("Secret '{secret_name}' must be at least {expected} characters, got {actual}")]
    InvalidLength {
        secret_name: String,
        expected: usize,
        actual: usize,
    },
}

/// Centralized manager for application secrets
pub struct SecretManager {
    jwt_secret: String,
    password_pepper: String,
    refresh_token_secret: String,
}

impl SecretManager {
    /// Load and validate all secrets from the process environment
    pub fn init() -> Result<Self, SecretError> {
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    /// Load and validate all secrets through the given provider
    ///
    /// # Errors
    /// Returns `SecretError` if any required secret is missing or too short
    pub fn from_env_provider(env: Arc<dyn EnvironmentProvider>) -> Result<Self, SecretError> {
        let jwt_secret = Self::load_secret(env.as_ref(), &SecretConfig::env_var("JWT_SECRET").min_length(32))?;
        let password_pepper =
            Self::load_secret(env.as_ref(), &SecretConfig::env_var("PASSWORD_PEPPER").min_length(16))?;
        let refresh_token_secret =
            Self::load_secret(env.as_ref(), &SecretConfig::env_var("REFRESH_TOKEN_SECRET").min_length(32))?;

        Ok(Self {
            jwt_secret,
            password_pepper,
            refresh_token_secret,
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Pepper mixed into Argon2 password hashes
    pub fn password_pepper(&self) -> &str {
        &self.password_pepper
    }

    /// HMAC key for refresh token hashes
    pub fn refresh_token_secret(&self) -> &str {
        &self.refresh_token_secret
    }

    fn load_secret(env: &dyn EnvironmentProvider, config: &SecretConfig) -> Result<String, SecretError> {
        let name = config.secret_type.name();
        let value = match &config.secret_type {
            SecretType::EnvVar { name } => match env.get_var(name) {
                Some(v) => v,
                None if !config.required => return Ok(String::new()),
                None => {
                    return Err(SecretError::Missing {
                        secret_name: name.clone(),
                    });
                }
            },
        };

        if let Some(min_len) = config.min_length {
            if value.len() < min_len {
                return Err(SecretError::InvalidLength {
                    secret_name: name.to_string(),
                    expected: min_len,
                    actual: value.len(),
                });
            }
        }

        Ok(value)
    }
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretManager")
            .field("jwt_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretManager {{ secrets_loaded: 3 }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticEnvironment;

    const JWT: &str = "this-is-a-valid-jwt-secret-with-32-characters";
    const PEPPER: &str = "valid-pepper-16ch";
    const REFRESH: &str = "refresh-secret-that-is-at-least-32-chars";

    fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvironmentProvider> {
        Arc::new(StaticEnvironment::empty().with_vars(vars))
    }

    #[test]
    fn test_successful_initialization_with_valid_secrets() {
        let manager = SecretManager::from_env_provider(env(&[
            ("JWT_SECRET", JWT),
            ("PASSWORD_PEPPER", PEPPER),
            ("REFRESH_TOKEN_SECRET", REFRESH),
        ]))
        .unwrap();

        assert_eq!(manager.jwt_secret(), JWT);
        assert_eq!(manager.password_pepper(), PEPPER);
        assert_eq!(manager.refresh_token_secret(), REFRESH);
    }

    #[test]
    fn test_error_when_jwt_secret_missing() {
        let result = SecretManager::from_env_provider(env(&[
            ("PASSWORD_PEPPER", PEPPER),
            ("REFRESH_TOKEN_SECRET", REFRESH),
        ]));

        match result {
            Err(SecretError::Missing { secret_name }) => assert_eq!(secret_name, "JWT_SECRET"),
            other => panic!("Expected Missing error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_error_when_pepper_too_short() {
        let result = SecretManager::from_env_provider(env(&[
            ("JWT_SECRET", JWT),
            ("PASSWORD_PEPPER", "short"),
            ("REFRESH_TOKEN_SECRET", REFRESH),
        ]));

        match result {
            Err(SecretError::InvalidLength { secret_name, expected, actual }) => {
                assert_eq!(secret_name, "PASSWORD_PEPPER");
                assert_eq!(expected, 16);
                assert_eq!(actual, 5);
            }
            other => panic!("Expected InvalidLength error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let manager = SecretManager::from_env_provider(env(&[
            ("JWT_SECRET", JWT),
            ("PASSWORD_PEPPER", PEPPER),
            ("REFRESH_TOKEN_SECRET", REFRESH),
        ]))
        .unwrap();

        let debug = format!("{:?}", manager);
        assert!(!debug.contains(JWT));
        assert!(debug.contains("<redacted>"));
    }
}
