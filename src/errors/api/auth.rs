use crate::errors::internal::{CredentialError, InternalError, OAuthError};
use poem_openapi::{ApiResponse, Object, payload::Json};
use std::fmt;

/// Standardized error response for authentication endpoints
#[derive(Object, Debug)]
pub struct AuthErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Authentication error types
#[derive(ApiResponse, Debug)]
pub enum AuthError {
    /// Invalid email or password
    #[oai(status = 401)]
    InvalidCredentials(Json<AuthErrorResponse>),

    /// Current password is incorrect (for password change)
    #[oai(status = 401)]
    IncorrectPassword(Json<AuthErrorResponse>),

    /// Request is missing fields or carries an unusable OAuth state
    #[oai(status = 400)]
    BadRequest(Json<AuthErrorResponse>),

    /// Password validation failed
    #[oai(status = 400)]
    PasswordValidationFailed(Json<AuthErrorResponse>),

    /// Identity provider rejected the exchange or could not be reached
    #[oai(status = 400)]
    AuthenticationFailed(Json<AuthErrorResponse>),

    /// Email already belongs to another account
    #[oai(status = 409)]
    EmailExists(Json<AuthErrorResponse>),

    /// Provider identity already belongs to another account
    #[oai(status = 409)]
    AlreadyLinked(Json<AuthErrorResponse>),

    /// Invalid or malformed JWT
    #[oai(status = 401)]
    InvalidToken(Json<AuthErrorResponse>),

    /// JWT has expired
    #[oai(status = 401)]
    ExpiredToken(Json<AuthErrorResponse>),

    /// Invalid refresh token
    #[oai(status = 401)]
    InvalidRefreshToken(Json<AuthErrorResponse>),

    /// Refresh token has expired
    #[oai(status = 401)]
    ExpiredRefreshToken(Json<AuthErrorResponse>),

    /// Identity provider is not configured on this server
    #[oai(status = 503)]
    ProviderUnavailable(Json<AuthErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<AuthErrorResponse>),
}

fn body(error: &str, message: impl Into<String>, status_code: u16) -> Json<AuthErrorResponse> {
    Json(AuthErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
    })
}

impl AuthError {
    pub fn invalid_credentials() -> Self {
        AuthError::InvalidCredentials(body("invalid_credentials", "Invalid email or password", 401))
    }

    pub fn incorrect_password() -> Self {
        AuthError::IncorrectPassword(body("incorrect_password", "Current password is incorrect", 401))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AuthError::BadRequest(body("bad_request", message, 400))
    }

    pub fn password_validation_failed(message: String) -> Self {
        AuthError::PasswordValidationFailed(body("password_validation_failed", message, 400))
    }

    pub fn authentication_failed() -> Self {
        AuthError::AuthenticationFailed(body("authentication_failed", "Authentication failed", 400))
    }

    pub fn email_exists() -> Self {
        AuthError::EmailExists(body("email_exists", "Email already exists", 409))
    }

    pub fn already_linked(provider: &str) -> Self {
        let provider_name = match provider {
            "github" => "GitHub",
            "wechat" => "WeChat",
            other => other,
        };
        AuthError::AlreadyLinked(body(
            "already_linked",
            format!("{} account already linked to another user", provider_name),
            409,
        ))
    }

    pub fn invalid_token() -> Self {
        AuthError::InvalidToken(body("invalid_token", "Invalid or malformed JWT", 401))
    }

    pub fn expired_token() -> Self {
        AuthError::ExpiredToken(body("expired_token", "JWT has expired", 401))
    }

    pub fn invalid_refresh_token() -> Self {
        AuthError::InvalidRefreshToken(body("invalid_refresh_token", "Invalid refresh token", 401))
    }

    pub fn expired_refresh_token() -> Self {
        AuthError::ExpiredRefreshToken(body("expired_refresh_token", "Refresh token has expired", 401))
    }

    pub fn provider_unavailable(provider: &str) -> Self {
        AuthError::ProviderUnavailable(body(
            "provider_unavailable",
            format!("{} login is not configured", provider),
            503,
        ))
    }

    /// Convert InternalError to AuthError
    ///
    /// This is the explicit conversion point from internal errors to API errors.
    /// Internal error details are logged but not exposed to clients.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Database(db_err) => {
                tracing::error!("Database error in auth operation: {}", db_err);
                Self::internal_server_error()
            }
            InternalError::Parse { value_type, .. } => {
                tracing::error!("Parse error for {}: {}", value_type, err);
                Self::internal_server_error()
            }
            InternalError::Crypto { operation, .. } => {
                tracing::error!("Crypto error in {}: {}", operation, err);
                Self::internal_server_error()
            }

            InternalError::Credential(CredentialError::InvalidCredentials) => {
                tracing::debug!("Invalid credentials attempt");
                Self::invalid_credentials()
            }
            InternalError::Credential(CredentialError::IncorrectPassword) => {
                tracing::debug!("Incorrect password for password change");
                Self::incorrect_password()
            }
            InternalError::Credential(CredentialError::PasswordValidationFailed(message)) => {
                tracing::debug!("Password validation failed: {}", message);
                Self::password_validation_failed(message.clone())
            }
            InternalError::Credential(CredentialError::EmailExists) => {
                tracing::debug!("Email already registered");
                Self::email_exists()
            }
            InternalError::Credential(CredentialError::ProviderAlreadyLinked { provider }) => {
                tracing::warn!("{} identity already linked elsewhere", provider);
                Self::already_linked(provider)
            }
            InternalError::Credential(CredentialError::InvalidInput(message)) => Self::bad_request(message.clone()),
            InternalError::Credential(CredentialError::MissingFields(_)) => {
                Self::bad_request("Missing required fields")
            }
            InternalError::Credential(CredentialError::InvalidToken { token_type, reason }) => {
                tracing::debug!("Invalid token: {} - {}", token_type, reason);
                if token_type == "refresh_token" {
                    Self::invalid_refresh_token()
                } else {
                    Self::invalid_token()
                }
            }
            InternalError::Credential(CredentialError::ExpiredToken(token_type)) => {
                tracing::debug!("Expired token: {}", token_type);
                if token_type == "refresh_token" {
                    Self::expired_refresh_token()
                } else {
                    Self::expired_token()
                }
            }
            InternalError::Credential(CredentialError::UserNotFound(user_id)) => {
                // Token outlived its account
                tracing::debug!("Token subject {} no longer exists", user_id);
                Self::invalid_token()
            }

            InternalError::OAuth(OAuthError::InvalidState) => Self::bad_request("Invalid or expired state"),
            InternalError::OAuth(OAuthError::MissingCodeOrState) => Self::bad_request("Missing code or state"),
            InternalError::OAuth(OAuthError::PendingRegistrationMissing { provider }) => {
                let provider_name = if provider == "github" { "GitHub" } else { provider.as_str() };
                Self::bad_request(format!("No pending {} registration", provider_name))
            }
            InternalError::OAuth(OAuthError::Upstream { provider, message }) => {
                tracing::warn!("{} authentication failed: {}", provider, message);
                Self::authentication_failed()
            }
            InternalError::OAuth(OAuthError::NotConfigured { provider }) => {
                tracing::warn!("{} login requested but not configured", provider);
                Self::provider_unavailable(provider)
            }

            // Other domain errors that shouldn't appear in auth context
            _ => {
                tracing::error!("Unexpected error in auth operation: {}", err);
                Self::internal_server_error()
            }
        }
    }

    /// Generic internal server error without internal details
    fn internal_server_error() -> Self {
        AuthError::InternalError(body("internal_error", "An internal error occurred", 500))
    }
}

impl From<InternalError> for AuthError {
    fn from(err: InternalError) -> Self {
        Self::from_internal_error(err)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            AuthError::InvalidCredentials(json)
            | AuthError::IncorrectPassword(json)
            | AuthError::BadRequest(json)
            | AuthError::PasswordValidationFailed(json)
            | AuthError::AuthenticationFailed(json)
            | AuthError::EmailExists(json)
            | AuthError::AlreadyLinked(json)
            | AuthError::InvalidToken(json)
            | AuthError::ExpiredToken(json)
            | AuthError::InvalidRefreshToken(json)
            | AuthError::ExpiredRefreshToken(json)
            | AuthError::ProviderUnavailable(json)
            | AuthError::InternalError(json) => &json.message,
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for AuthError {}
