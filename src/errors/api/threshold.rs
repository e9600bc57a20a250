use crate::errors::api::forbidden_message;
use crate::errors::internal::{CredentialError, InternalError, ThresholdConfigError};
use poem_openapi::{ApiResponse, Object, payload::Json};
use std::fmt;

/// Error response for threshold endpoints
#[derive(Object, Debug)]
pub struct ThresholdErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,

    /// Itemized validation failures
    #[oai(skip_serializing_if_is_none)]
    pub details: Option<Vec<String>>,
}

/// Threshold configuration error types
#[derive(ApiResponse, Debug)]
pub enum ThresholdError {
    /// Configuration failed structural or safety bound checks
    #[oai(status = 400)]
    ValidationError(Json<ThresholdErrorResponse>),

    /// Referenced configuration does not exist
    #[oai(status = 400)]
    NotFound(Json<ThresholdErrorResponse>),

    /// Configuration is not in a state that allows the operation
    #[oai(status = 400)]
    InvalidState(Json<ThresholdErrorResponse>),

    /// Missing, invalid or revoked bearer token
    #[oai(status = 401)]
    Unauthorized(Json<ThresholdErrorResponse>),

    /// Caller's role is below the endpoint's requirement
    #[oai(status = 403)]
    Forbidden(Json<ThresholdErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ThresholdErrorResponse>),
}

fn body(error: &str, message: impl Into<String>, status_code: u16) -> Json<ThresholdErrorResponse> {
    Json(ThresholdErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code,
        details: None,
    })
}

impl ThresholdError {
    pub fn validation(details: Vec<String>) -> Self {
        ThresholdError::ValidationError(Json(ThresholdErrorResponse {
            error: "validation_error".to_string(),
            message: "Validation error".to_string(),
            status_code: 400,
            details: Some(details),
        }))
    }

    pub fn not_found() -> Self {
        ThresholdError::NotFound(body("not_found", "Configuration not found", 400))
    }

    pub fn invalid_state() -> Self {
        ThresholdError::InvalidState(body(
            "invalid_state",
            "Only draft configurations can be published",
            400,
        ))
    }

    pub fn unauthorized() -> Self {
        ThresholdError::Unauthorized(body("unauthorized", "Authentication required", 401))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ThresholdError::Forbidden(body("forbidden", message, 403))
    }

    /// Convert InternalError to ThresholdError
    ///
    /// Exhausted retries on transient storage faults end up here as a 500.
    pub fn from_internal_error(err: InternalError) -> Self {
        match err {
            InternalError::ThresholdConfig(ThresholdConfigError::Validation(details)) => {
                tracing::debug!("Threshold config rejected: {:?}", details);
                Self::validation(details)
            }
            InternalError::ThresholdConfig(ThresholdConfigError::NotFound(id)) => {
                tracing::debug!("Threshold config {} not found", id);
                Self::not_found()
            }
            InternalError::ThresholdConfig(ThresholdConfigError::InvalidState { config_id, status }) => {
                tracing::debug!("Threshold config {} is {}, cannot publish", config_id, status);
                Self::invalid_state()
            }
            InternalError::Credential(CredentialError::InvalidToken { .. })
            | InternalError::Credential(CredentialError::ExpiredToken(_))
            | InternalError::Credential(CredentialError::UserNotFound(_)) => Self::unauthorized(),
            InternalError::Credential(CredentialError::InsufficientRole { required, actual }) => {
                tracing::warn!("Role gate denied: {} required, caller is {}", required, actual);
                Self::forbidden(forbidden_message(required))
            }
            other => {
                tracing::error!("Unexpected error in threshold operation: {}", other);
                Self::internal_server_error()
            }
        }
    }

    fn internal_server_error() -> Self {
        ThresholdError::InternalError(body("internal_error", "An internal error occurred", 500))
    }
}

impl From<InternalError> for ThresholdError {
    fn from(err: InternalError) -> Self {
        Self::from_internal_error(err)
    }
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ThresholdError::ValidationError(json)
            | ThresholdError::NotFound(json)
            | ThresholdError::InvalidState(json)
            | ThresholdError::Unauthorized(json)
            | ThresholdError::Forbidden(json)
            | ThresholdError::InternalError(json) => &json.message,
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for ThresholdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_carries_details() {
        let err = ThresholdError::from_internal_error(
            ThresholdConfigError::Validation(vec!["systolic_min must be less than systolic_max".to_string()]).into(),
        );
        match err {
            ThresholdError::ValidationError(json) => {
                assert_eq!(json.error, "validation_error");
                assert_eq!(json.details.as_ref().map(|d| d.len()), Some(1));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_publish_errors_are_400() {
        let not_found = ThresholdError::from_internal_error(ThresholdConfigError::NotFound(9).into());
        assert!(matches!(not_found, ThresholdError::NotFound(ref json) if json.status_code == 400));
        assert_eq!(not_found.to_string(), "Configuration not found");

        let invalid = ThresholdError::from_internal_error(
            ThresholdConfigError::InvalidState { config_id: 1, status: "active".to_string() }.into(),
        );
        assert_eq!(invalid.to_string(), "Only draft configurations can be published");
    }

    #[test]
    fn test_transient_failure_surfaces_as_500() {
        let err = ThresholdError::from_internal_error(InternalError::database(
            "create_draft",
            sea_orm::DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout),
        ));
        assert!(matches!(err, ThresholdError::InternalError(_)));
    }
}
