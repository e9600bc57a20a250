use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, OAuthError};
use crate::services::AuthService;
use crate::services::crypto::generate_url_token;
use crate::services::identity_resolver::{EmailMatch, IdentityResolver};
use crate::services::oauth::GithubApi;
use crate::services::oauth::github::select_email;
use crate::stores::credential_store::is_plausible_email;
use crate::stores::{DEFAULT_STATE_TTL, StateStore};
use crate::types::db::user;
use crate::types::internal::auth::TokenPair;
use crate::types::internal::identity::{NewAccount, PendingGithubRegistration, Provider, ProviderIdentity};

const STATE_PREFIX: &str = "github:state:";
const PENDING_PREFIX: &str = "github:pending:";

/// Result of a completed GitHub callback
#[derive(Debug)]
pub enum GithubCallbackOutcome {
    Authenticated { user: user::Model, tokens: TokenPair },
    /// GitHub disclosed no usable email; the client must submit one with this token
    EmailRequired { pending_token: String },
}

/// GitHub OAuth flow: state issuance, callback handling and email completion
pub struct GithubAuthService {
    db: DatabaseConnection,
    api: Option<Arc<dyn GithubApi>>,
    state_store: Arc<dyn StateStore>,
    resolver: Arc<IdentityResolver>,
    auth_service: Arc<AuthService>,
}

impl GithubAuthService {
    pub fn new(
        db: DatabaseConnection,
        api: Option<Arc<dyn GithubApi>>,
        state_store: Arc<dyn StateStore>,
        resolver: Arc<IdentityResolver>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            db,
            api,
            state_store,
            resolver,
            auth_service,
        }
    }

    fn api(&self) -> Result<&Arc<dyn GithubApi>, InternalError> {
        self.api.as_ref().ok_or_else(|| {
            OAuthError::NotConfigured {
                provider: "github".to_string(),
            }
            .into()
        })
    }

    /// Store a fresh state and return the authorize URL to redirect to
    pub async fn begin_login(&self) -> Result<String, InternalError> {
        let api = self.api()?;
        let state = generate_url_token(32);
        self.state_store
            .set(&format!("{STATE_PREFIX}{state}"), json!({}), DEFAULT_STATE_TTL)
            .await?;
        Ok(api.authorize_url(&state))
    }

    /// Consume the state, exchange the code and resolve the account
    ///
    /// The state is checked before any call to GitHub.
    pub async fn handle_callback(&self, code: &str, state: &str) -> Result<GithubCallbackOutcome, InternalError> {
        if code.is_empty() || state.is_empty() {
            return Err(OAuthError::MissingCodeOrState.into());
        }
        let api = self.api()?;

        if self.state_store.take(&format!("{STATE_PREFIX}{state}")).await?.is_none() {
            tracing::warn!("GitHub callback with unknown or replayed state");
            return Err(OAuthError::InvalidState.into());
        }

        let access_token = api.exchange_code(code).await?;
        let profile = api.fetch_profile(&access_token).await?;

        let email = match profile.email.filter(|e| !e.trim().is_empty()) {
            Some(email) => Some(email),
            // Private email: fall back to the verified address list
            None => match api.fetch_emails(&access_token).await {
                Ok(emails) => select_email(&emails),
                Err(err) => {
                    tracing::warn!("Could not list GitHub emails for {}: {}", profile.login, err);
                    None
                }
            },
        };

        let identity = ProviderIdentity {
            provider: Provider::Github,
            provider_id: profile.id.to_string(),
            provider_username: Some(profile.login.clone()),
            display_name: profile.name.clone(),
            email: email.clone(),
        };

        let Some(email) = email else {
            // A linked account needs no email to sign in
            if let Some(linked) = self.resolver.login_linked(Provider::Github, &identity.provider_id).await? {
                return self.authenticated(linked).await;
            }
            return self.stash_pending(profile.id, profile.login, profile.name).await;
        };

        let account = NewAccount {
            username: identity.display_name.clone().unwrap_or_else(|| profile.login.clone()),
            email,
            password: None,
        };
        let user = self
            .resolver
            .resolve(&identity, account, EmailMatch::Link)
            .await?
            .into_user();

        self.authenticated(user).await
    }

    /// Finish a registration that stalled for lack of an email
    pub async fn complete_registration(
        &self,
        pending_token: &str,
        email: &str,
    ) -> Result<(user::Model, TokenPair), InternalError> {
        if email.trim().is_empty() {
            return Err(CredentialError::InvalidInput("Email is required".to_string()).into());
        }
        if !is_plausible_email(email) {
            return Err(CredentialError::InvalidInput("Invalid email address".to_string()).into());
        }

        let missing = || OAuthError::PendingRegistrationMissing {
            provider: "github".to_string(),
        };
        if pending_token.is_empty() {
            return Err(missing().into());
        }
        let stored = self
            .state_store
            .take(&format!("{PENDING_PREFIX}{pending_token}"))
            .await?
            .ok_or_else(missing)?;
        let pending: PendingGithubRegistration =
            serde_json::from_value(stored).map_err(|e| InternalError::parse("github_pending", e.to_string()))?;

        let identity = ProviderIdentity {
            provider: Provider::Github,
            provider_id: pending.github_id,
            provider_username: Some(pending.github_username.clone()),
            display_name: pending.name.clone(),
            email: Some(email.to_string()),
        };
        let account = NewAccount {
            username: pending.name.unwrap_or(pending.github_username),
            email: email.to_string(),
            password: None,
        };

        // Client-typed email is unverified, so it may not claim an existing account
        let user = self
            .resolver
            .resolve(&identity, account, EmailMatch::Reject)
            .await?
            .into_user();
        let tokens = self.auth_service.issue_tokens(&self.db, &user).await?;
        Ok((user, tokens))
    }

    async fn stash_pending(
        &self,
        github_id: i64,
        github_username: String,
        name: Option<String>,
    ) -> Result<GithubCallbackOutcome, InternalError> {
        let pending = PendingGithubRegistration {
            github_id: github_id.to_string(),
            github_username,
            name,
        };
        let value = serde_json::to_value(&pending).map_err(|e| InternalError::parse("github_pending", e.to_string()))?;

        let pending_token = generate_url_token(32);
        self.state_store
            .set(&format!("{PENDING_PREFIX}{pending_token}"), value, DEFAULT_STATE_TTL)
            .await?;

        tracing::info!("GitHub user {} has no visible email, awaiting completion", pending.github_username);
        Ok(GithubCallbackOutcome::EmailRequired { pending_token })
    }

    async fn authenticated(&self, user: user::Model) -> Result<GithubCallbackOutcome, InternalError> {
        let tokens = self.auth_service.issue_tokens(&self.db, &user).await?;
        Ok(GithubCallbackOutcome::Authenticated { user, tokens })
    }
}

impl std::fmt::Debug for GithubAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubAuthService")
            .field("configured", &self.api.is_some())
            .finish_non_exhaustive()
    }
}
