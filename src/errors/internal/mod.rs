use thiserror::Error;

pub mod credential;
pub mod database;
pub mod oauth;
pub mod threshold;

pub use credential::CredentialError;
pub use database::DatabaseError;
pub use oauth::OAuthError;
pub use threshold::ThresholdConfigError;

/// Internal error type for store and service operations
///
/// Hybrid design separates infrastructure errors (shared) from domain errors.
/// Not exposed via API - endpoints must convert to an API error type.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Parse error: failed to parse {value_type}: {message}")]
    Parse {
        value_type: String,
        message: String,
    },

    #[error("Crypto error: {operation} failed: {message}")]
    Crypto {
        operation: String,
        message: String,
    },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    ThresholdConfig(#[from] ThresholdConfigError),

    #[error(transparent)]
    OAuth(#[from] OAuthError),
}

impl InternalError {
    pub fn database(operation: &str, source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::Operation {
            operation: operation.to_string(),
            source,
        })
    }

    pub fn transaction_begin(source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::TransactionBegin { source })
    }

    pub fn transaction_commit(source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::TransactionCommit { source })
    }

    pub fn parse(value_type: &str, message: impl Into<String>) -> InternalError {
        InternalError::Parse {
            value_type: value_type.to_string(),
            message: message.into(),
        }
    }

    pub fn crypto(operation: &str, message: impl Into<String>) -> InternalError {
        InternalError::Crypto {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Whether retrying the failed operation could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            InternalError::Database(err) => err.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_database_error_includes_operation() {
        let error = InternalError::database("create_draft", DbErr::RecordNotFound("x".to_string()));

        let error_string = error.to_string();
        assert!(error_string.contains("create_draft"));
        assert!(error_string.contains("Database error"));
    }

    #[test]
    fn test_parse_error_includes_value_type() {
        let error = InternalError::parse("threshold_config", "invalid json");

        let error_string = error.to_string();
        assert!(error_string.contains("threshold_config"));
        assert!(error_string.contains("invalid json"));
    }

    #[test]
    fn test_crypto_error_includes_operation() {
        let error = InternalError::crypto("argon2_init", "invalid secret length");
        assert!(error.to_string().contains("argon2_init"));
    }

    #[test]
    fn test_domain_errors_are_not_transient() {
        let error: InternalError = ThresholdConfigError::NotFound(1).into();
        assert!(!error.is_transient());

        let error: InternalError = CredentialError::EmailExists.into();
        assert!(!error.is_transient());
    }

    #[test]
    fn test_connection_errors_are_transient() {
        let error = InternalError::database(
            "publish",
            DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout),
        );
        assert!(error.is_transient());
    }
}
