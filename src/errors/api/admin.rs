use crate::errors::api::forbidden_message;
use crate::errors::internal::{CredentialError, InternalError};
use poem_openapi::{ApiResponse, Object, payload::Json};
use std::fmt;

/// Standardized error response for admin endpoints
#[derive(Object, Debug)]
pub struct AdminErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}

/// Admin operation error types
#[derive(ApiResponse, Debug)]
pub enum AdminError {
    /// Operation not allowed on the target account
    #[oai(status = 400)]
    BadRequest(Json<AdminErrorResponse>),

    /// Missing, invalid or revoked bearer token
    #[oai(status = 401)]
    Unauthorized(Json<AdminErrorResponse>),

    /// Caller's role is below the endpoint's requirement
    #[oai(status = 403)]
    Forbidden(Json<AdminErrorResponse>),

    /// User not found
    #[oai(status = 404)]
    UserNotFound(Json<AdminErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<AdminErrorResponse>),
}

fn body(error: &str, message: impl Into<String>, status_code: u16) -> Json<AdminErrorResponse> {
    Json(AdminErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
    })
}

impl AdminError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AdminError::BadRequest(body("bad_request", message, 400))
    }

    pub fn unauthorized() -> Self {
        AdminError::Unauthorized(body("unauthorized", "Authentication required", 401))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AdminError::Forbidden(body("forbidden", message, 403))
    }

    pub fn user_not_found() -> Self {
        AdminError::UserNotFound(body("not_found", "User not found", 404))
    }

    /// Convert InternalError to AdminError
    ///
    /// Internal error details are logged but not exposed to clients.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Credential(CredentialError::InvalidToken { .. })
            | InternalError::Credential(CredentialError::ExpiredToken(_)) => {
                tracing::debug!("Rejected admin request: {}", err);
                Self::unauthorized()
            }
            InternalError::Credential(CredentialError::InsufficientRole { required, actual }) => {
                tracing::warn!("Role gate denied: {} required, caller is {}", required, actual);
                Self::forbidden(forbidden_message(*required))
            }
            InternalError::Credential(CredentialError::UserNotFound(user_id)) => {
                tracing::debug!("Admin target user not found: {}", user_id);
                Self::user_not_found()
            }
            InternalError::Credential(CredentialError::ProtectedRole) => {
                Self::bad_request("Cannot modify SUPER_ADMIN role")
            }
            InternalError::Credential(CredentialError::InvalidInput(message)) => Self::bad_request(message.clone()),
            InternalError::Credential(CredentialError::SelfResetDenied) => {
                Self::bad_request("Use self change-password API for your own account")
            }
            _ => {
                tracing::error!("Unexpected error in admin operation: {}", err);
                Self::internal_server_error()
            }
        }
    }

    fn internal_server_error() -> Self {
        AdminError::InternalError(body("internal_error", "An internal error occurred", 500))
    }
}

impl From<InternalError> for AdminError {
    fn from(err: InternalError) -> Self {
        Self::from_internal_error(err)
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            AdminError::BadRequest(json)
            | AdminError::Unauthorized(json)
            | AdminError::Forbidden(json)
            | AdminError::UserNotFound(json)
            | AdminError::InternalError(json) => &json.message,
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for AdminError {}
