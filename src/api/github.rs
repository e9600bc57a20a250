use std::sync::Arc;

use poem_openapi::param::Query;
use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::errors::AuthError;
use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, OAuthError};
use crate::services::oauth::with_query;
use crate::services::{GithubAuthService, GithubCallbackOutcome};
use crate::types::dto::auth::{LoginResponse, UserResponse};
use crate::types::dto::oauth::{GithubCompleteRequest, RedirectResponse};

/// GitHub OAuth endpoints
///
/// Login and callback are browser redirects; outcomes reach the frontend as
/// query parameters on `FRONTEND_URL` pages.
pub struct GithubAuthApi {
    github_service: Arc<GithubAuthService>,
    frontend_url: String,
}

impl GithubAuthApi {
    pub fn new(github_service: Arc<GithubAuthService>, frontend_url: String) -> Self {
        Self {
            github_service,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    fn frontend_redirect(&self, path: &str, params: &[(&str, &str)]) -> RedirectResponse {
        RedirectResponse::Found(with_query(&format!("{}{}", self.frontend_url, path), params))
    }

    fn login_error(&self, code: &str) -> RedirectResponse {
        self.frontend_redirect("/login", &[("error", code)])
    }

    /// Map a callback result onto a frontend redirect or a 400
    fn callback_redirect(
        &self,
        result: Result<GithubCallbackOutcome, InternalError>,
    ) -> Result<RedirectResponse, AuthError> {
        match result {
            Ok(GithubCallbackOutcome::Authenticated { tokens, .. }) => Ok(self.frontend_redirect(
                "/login/callback",
                &[
                    ("access_token", tokens.access_token.as_str()),
                    ("refresh_token", tokens.refresh_token.as_str()),
                ],
            )),
            Ok(GithubCallbackOutcome::EmailRequired { pending_token }) => Ok(self.frontend_redirect(
                "/login/complete-registration",
                &[("token", pending_token.as_str())],
            )),
            Err(InternalError::OAuth(OAuthError::MissingCodeOrState)) => {
                Err(AuthError::bad_request("Missing code or state parameter"))
            }
            Err(InternalError::OAuth(OAuthError::InvalidState)) => Err(AuthError::bad_request("Invalid OAuth state")),
            Err(InternalError::Credential(CredentialError::EmailExists)) => Ok(self.login_error("email_exists")),
            Err(err @ InternalError::OAuth(OAuthError::Upstream { .. }))
            | Err(err @ InternalError::Credential(CredentialError::ProviderAlreadyLinked { .. })) => {
                tracing::warn!("GitHub sign-in failed: {}", err);
                Ok(self.login_error("github_failed"))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Tags)]
enum GithubTags {
    /// GitHub sign-in
    Github,
}

#[OpenApi(prefix_path = "/auth/github")]
impl GithubAuthApi {
    /// Redirect to GitHub's authorize page
    #[oai(path = "/login", method = "get", tag = "GithubTags::Github")]
    async fn login(&self) -> Result<RedirectResponse, AuthError> {
        let authorize_url = self.github_service.begin_login().await?;
        Ok(RedirectResponse::Found(authorize_url))
    }

    /// GitHub redirects here after the user approves or denies access
    #[oai(path = "/callback", method = "get", tag = "GithubTags::Github")]
    async fn callback(
        &self,
        code: Query<Option<String>>,
        state: Query<Option<String>>,
        error: Query<Option<String>>,
    ) -> Result<RedirectResponse, AuthError> {
        if let Some(error) = error.0 {
            tracing::info!("GitHub authorization not granted: {}", error);
            return Ok(self.login_error("github_cancelled"));
        }

        let code = code.0.unwrap_or_default();
        let state = state.0.unwrap_or_default();

        let result = self.github_service.handle_callback(&code, &state).await;
        self.callback_redirect(result)
    }

    /// Finish a GitHub sign-up by supplying the email GitHub withheld
    #[oai(path = "/complete", method = "post", tag = "GithubTags::Github")]
    async fn complete(&self, body: Json<GithubCompleteRequest>) -> Result<Json<LoginResponse>, AuthError> {
        let (user, tokens) = self
            .github_service
            .complete_registration(
                body.pending_token.as_deref().unwrap_or_default(),
                body.email.as_deref().unwrap_or_default(),
            )
            .await?;

        Ok(Json(LoginResponse {
            tokens: tokens.into(),
            must_change_password: user.must_change_password,
            user: UserResponse::from(&user),
        }))
    }
}
