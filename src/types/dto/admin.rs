use poem_openapi::Object;

use crate::types::dto::auth::UserResponse;

/// All accounts, for the admin console
#[derive(Object, Debug)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub total: u64,
}

/// Response after a role change
#[derive(Object, Debug)]
pub struct RoleChangeResponse {
    /// Human-readable message describing the result
    pub message: String,

    /// The account after the change
    pub user: UserResponse,
}

/// Response after an admin password reset
#[derive(Object, Debug)]
pub struct ResetPasswordResponse {
    pub message: String,

    /// Shown once; the user must change it at next login
    pub temp_password: String,
}
