use std::sync::Arc;

use poem::Request;
use poem_openapi::auth::Bearer;
use poem_openapi::{OpenApi, SecurityScheme, Tags, payload::Json};

use crate::api::helpers;
use crate::errors::AuthError;
use crate::services::AuthService;
use crate::types::dto::auth::{
    ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse, LogoutRequest, RefreshRequest,
    RefreshResponse, RegisterApiResponse, RegisterRequest, UserResponse,
};
use crate::types::dto::common::MessageResponse;
use crate::types::internal::context::RequestContext;

/// Password account endpoints
pub struct AuthApi {
    auth_service: Arc<AuthService>,
}

impl AuthApi {
    /// Create a new AuthApi with the given AuthService
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }
}

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(ty = "bearer", key_name = "Authorization", key_in = "header", bearer_format = "JWT")]
pub struct BearerAuth(pub Bearer);

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Create a password account
    #[oai(path = "/register", method = "post", tag = "AuthTags::Authentication")]
    async fn register(&self, req: &Request, body: Json<RegisterRequest>) -> Result<RegisterApiResponse, AuthError> {
        let ctx = RequestContext::from_request(req);
        let user = self
            .auth_service
            .register(&ctx, &body.username, &body.email, &body.password)
            .await?;

        Ok(RegisterApiResponse::Created(Json(UserResponse::from(&user))))
    }

    /// Authenticate with email and password
    ///
    /// Returns an access token (JWT, 30 minutes) and a refresh token (7 days).
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, req: &Request, body: Json<LoginRequest>) -> Result<Json<LoginResponse>, AuthError> {
        let ctx = RequestContext::from_request(req);
        let (user, tokens) = self.auth_service.login(&ctx, &body.email, &body.password).await?;

        Ok(Json(LoginResponse {
            tokens: tokens.into(),
            must_change_password: user.must_change_password,
            user: UserResponse::from(&user),
        }))
    }

    /// Obtain a new access token
    #[oai(path = "/refresh", method = "post", tag = "AuthTags::Authentication")]
    async fn refresh(&self, body: Json<RefreshRequest>) -> Result<Json<RefreshResponse>, AuthError> {
        let (access_token, expires_in) = self.auth_service.refresh(&body.refresh_token).await?;

        Ok(Json(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }))
    }

    /// Current user's account
    #[oai(path = "/me", method = "get", tag = "AuthTags::Authentication")]
    async fn me(&self, req: &Request, auth: BearerAuth) -> Result<Json<UserResponse>, AuthError> {
        let ctx = helpers::authenticate(req, &auth, &self.auth_service).await?;
        let user = self.auth_service.me(&ctx).await?;

        Ok(Json(UserResponse::from(&user)))
    }

    /// Change the current user's password
    ///
    /// Revokes every existing token and returns a new pair.
    #[oai(path = "/change-password", method = "post", tag = "AuthTags::Authentication")]
    async fn change_password(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<ChangePasswordRequest>,
    ) -> Result<Json<ChangePasswordResponse>, AuthError> {
        let ctx = helpers::authenticate(req, &auth, &self.auth_service).await?;
        let tokens = self
            .auth_service
            .change_password(&ctx, &body.current_password, &body.new_password)
            .await?;

        Ok(Json(ChangePasswordResponse {
            message: "Password changed successfully".to_string(),
            tokens: tokens.into(),
        }))
    }

    /// Logout and revoke refresh token
    #[oai(path = "/logout", method = "post", tag = "AuthTags::Authentication")]
    async fn logout(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<LogoutRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let ctx = helpers::authenticate(req, &auth, &self.auth_service).await?;
        self.auth_service.logout(&ctx, &body.refresh_token).await?;

        Ok(Json(MessageResponse::new("Logged out successfully")))
    }
}
