use thiserror::Error;

use crate::types::internal::auth::Role;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("Password validation failed: {0}")]
    PasswordValidationFailed(String),

    #[error("Email already exists")]
    EmailExists,

    /// Malformed request field; the message is safe to show
    #[error("{0}")]
    InvalidInput(String),

    #[error("{provider} account already linked to another user")]
    ProviderAlreadyLinked { provider: String },

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),

    #[error("Invalid token: {token_type} - {reason}")]
    InvalidToken { token_type: String, reason: String },

    #[error("Expired token: {0}")]
    ExpiredToken(String),

    #[error("Role {required} required, caller has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    #[error("Cannot modify SUPER_ADMIN role")]
    ProtectedRole,

    #[error("Use self change-password API for your own account")]
    SelfResetDenied,

    #[error("Missing required fields: {0}")]
    MissingFields(String),
}
