use std::sync::Arc;

use poem::Request;
use poem_openapi::param::Path;
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::api::auth::BearerAuth;
use crate::api::helpers;
use crate::errors::AdminError;
use crate::services::{AdminService, AuthService};
use crate::types::dto::admin::{ResetPasswordResponse, RoleChangeResponse, UserListResponse};
use crate::types::dto::auth::UserResponse;

/// User administration endpoints
pub struct AdminApi {
    admin_service: Arc<AdminService>,
    auth_service: Arc<AuthService>,
}

impl AdminApi {
    pub fn new(admin_service: Arc<AdminService>, auth_service: Arc<AuthService>) -> Self {
        Self {
            admin_service,
            auth_service,
        }
    }
}

/// API tags for admin endpoints
#[derive(Tags)]
enum AdminTags {
    /// User and role management
    Admin,
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// List all users (ADMIN or above)
    #[oai(path = "/users", method = "get", tag = "AdminTags::Admin")]
    async fn list_users(&self, req: &Request, auth: BearerAuth) -> Result<Json<UserListResponse>, AdminError> {
        let ctx = helpers::authenticate(req, &auth, &self.auth_service).await?;
        let users = self.admin_service.list_users(&ctx).await?;

        let items: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
        Ok(Json(UserListResponse {
            total: items.len() as u64,
            items,
        }))
    }

    /// Promote a user to ADMIN (SUPER_ADMIN only)
    #[oai(path = "/users/:user_id/promote-admin", method = "post", tag = "AdminTags::Admin")]
    async fn promote_admin(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<RoleChangeResponse>, AdminError> {
        let ctx = helpers::authenticate(req, &auth, &self.auth_service).await?;
        let user = self.admin_service.promote_admin(&ctx, &user_id).await?;

        Ok(Json(RoleChangeResponse {
            message: "Promoted to ADMIN".to_string(),
            user: UserResponse::from(&user),
        }))
    }

    /// Demote an ADMIN back to USER (SUPER_ADMIN only)
    #[oai(path = "/users/:user_id/demote-admin", method = "post", tag = "AdminTags::Admin")]
    async fn demote_admin(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<RoleChangeResponse>, AdminError> {
        let ctx = helpers::authenticate(req, &auth, &self.auth_service).await?;
        let user = self.admin_service.demote_admin(&ctx, &user_id).await?;

        Ok(Json(RoleChangeResponse {
            message: "Demoted to USER".to_string(),
            user: UserResponse::from(&user),
        }))
    }

    /// Reset another user's password to a generated temporary one
    #[oai(path = "/users/:user_id/reset-password", method = "post", tag = "AdminTags::Admin")]
    async fn reset_password(
        &self,
        req: &Request,
        auth: BearerAuth,
        user_id: Path<String>,
    ) -> Result<Json<ResetPasswordResponse>, AdminError> {
        let ctx = helpers::authenticate(req, &auth, &self.auth_service).await?;
        let temp_password = self.admin_service.reset_password(&ctx, &user_id).await?;

        Ok(Json(ResetPasswordResponse {
            message: "Password reset; user must change password on next login".to_string(),
            temp_password,
        }))
    }
}
