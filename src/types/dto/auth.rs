use poem_openapi::{ApiResponse, Object};
use poem_openapi::payload::Json;
use serde::{Deserialize, Serialize};

use crate::types::db::user;
use crate::types::dto::common::{format_optional_timestamp, format_timestamp};
use crate::types::internal::auth::TokenPair;

/// Request model for account registration
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name, at most 64 characters
    pub username: String,

    /// Email address used to sign in
    pub email: String,

    /// 8 to 128 characters with at least one letter and one digit
    pub password: String,
}

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID (UUID)
    pub id: String,
    pub username: String,
    pub email: String,

    /// USER, ADMIN or SUPER_ADMIN
    pub role: String,

    /// Set after an admin password reset; cleared by change-password
    pub must_change_password: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<&user::Model> for UserResponse {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            must_change_password: user.must_change_password,
            created_at: format_timestamp(user.created_at),
            last_login_at: format_optional_timestamp(user.last_login_at),
        }
    }
}

/// Response model containing authentication tokens
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,

    /// Number of seconds until the refresh token expires
    pub refresh_expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
            refresh_expires_in: tokens.refresh_expires_in,
        }
    }
}

/// Response model for login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[oai(flatten)]
    #[serde(flatten)]
    pub tokens: TokenResponse,

    /// The client should route to change-password before anything else
    pub must_change_password: bool,

    pub user: UserResponse,
}

/// Request model for token refresh
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token to exchange for a new access token
    pub refresh_token: String,
}

/// Response model for token refresh
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New JWT access token for API authentication
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the access token expires
    pub expires_in: i64,
}

/// Request model for logout
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to revoke
    pub refresh_token: String,
}

/// Request model for password change
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password for verification
    pub current_password: String,

    /// New password to set
    pub new_password: String,
}

/// Response model for password change
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    /// Success message
    pub message: String,

    /// Replacement tokens; every token issued before the change is revoked
    #[oai(flatten)]
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

/// API response for registration
#[derive(ApiResponse)]
pub enum RegisterApiResponse {
    /// Account created
    #[oai(status = 201)]
    Created(Json<UserResponse>),
}
