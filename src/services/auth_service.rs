use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::services::TokenService;
use crate::services::password_policy::PasswordPolicy;
use crate::stores::credential_store::is_plausible_email;
use crate::stores::{CredentialStore, NewUser};
use crate::types::db::user;
use crate::types::internal::auth::{Role, TokenPair};
use crate::types::internal::context::RequestContext;

/// Longest accepted display username
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Authentication service that orchestrates registration, login, token
/// refresh and bearer-token authentication
///
/// Coordinates CredentialStore and TokenService. Token issuance is shared
/// with the OAuth flows through `issue_tokens`.
pub struct AuthService {
    db: DatabaseConnection,
    credential_store: Arc<CredentialStore>,
    token_service: Arc<TokenService>,
    password_policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(
        db: DatabaseConnection,
        credential_store: Arc<CredentialStore>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            db,
            credential_store,
            token_service,
            password_policy: PasswordPolicy::new(),
        }
    }

    /// Check a password against the policy
    pub fn check_password(&self, password: &str) -> Result<(), InternalError> {
        self.password_policy
            .validate(password)
            .map_err(|e| CredentialError::PasswordValidationFailed(e.to_string()).into())
    }

    /// Check username and email shape for a new account
    pub fn check_account_fields(&self, username: &str, email: &str) -> Result<(), InternalError> {
        let username = username.trim();
        if username.is_empty() || email.trim().is_empty() {
            return Err(CredentialError::MissingFields("username, email".to_string()).into());
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(CredentialError::InvalidInput(format!(
                "Username must not exceed {} characters",
                MAX_USERNAME_LENGTH
            ))
            .into());
        }
        if !is_plausible_email(email) {
            return Err(CredentialError::InvalidInput("Invalid email address".to_string()).into());
        }
        Ok(())
    }

    /// Create a password account with the USER role
    pub async fn register(
        &self,
        ctx: &RequestContext,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<user::Model, InternalError> {
        self.check_account_fields(username, email)?;
        self.check_password(password)?;

        let user = self
            .credential_store
            .create_user(
                &self.db,
                NewUser {
                    username: username.trim().to_string(),
                    email: email.to_string(),
                    password: Some(password.to_string()),
                    role: Role::User,
                    must_change_password: false,
                    identity: None,
                },
            )
            .await?;

        tracing::info!(request_id = %ctx.request_id, "Registered user {}", user.id);
        Ok(user)
    }

    /// Verify email and password, then issue a token pair
    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<(user::Model, TokenPair), InternalError> {
        let account = match self.credential_store.verify_credentials(&self.db, email, password).await {
            Ok(account) => account,
            Err(err) => {
                tracing::debug!(request_id = %ctx.request_id, ip = ?ctx.ip_address, "Login failed: {}", err);
                return Err(err);
            }
        };

        self.credential_store.record_login(&self.db, &account.id).await?;
        let tokens = self.issue_tokens(&self.db, &account).await?;

        tracing::info!(request_id = %ctx.request_id, "User {} logged in", account.id);
        Ok((account, tokens))
    }

    /// Issue a JWT plus a stored refresh token for `account`
    pub async fn issue_tokens(
        &self,
        conn: &impl ConnectionTrait,
        account: &user::Model,
    ) -> Result<TokenPair, InternalError> {
        let access_token = self.token_service.generate_jwt(account)?;
        let refresh_token = self.token_service.generate_refresh_token();
        let token_hash = self.token_service.hash_refresh_token(&refresh_token)?;

        self.credential_store
            .store_refresh_token(conn, token_hash, account, self.token_service.get_refresh_expiration())
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.token_service.access_ttl_seconds(),
            refresh_expires_in: self.token_service.refresh_ttl_seconds(),
        })
    }

    /// Exchange a refresh token for a new access token
    ///
    /// Returns the JWT and its lifetime in seconds.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(String, i64), InternalError> {
        let token_hash = self.token_service.hash_refresh_token(refresh_token)?;
        let account = self.credential_store.validate_refresh_token(&self.db, &token_hash).await?;
        let access_token = self.token_service.generate_jwt(&account)?;

        tracing::debug!("Refreshed access token for user {}", account.id);
        Ok((access_token, self.token_service.access_ttl_seconds()))
    }

    /// Revoke a refresh token owned by the caller
    pub async fn logout(&self, ctx: &RequestContext, refresh_token: &str) -> Result<(), InternalError> {
        let user_id = ctx.require_role(Role::User)?;
        let token_hash = self.token_service.hash_refresh_token(refresh_token)?;

        if !self
            .credential_store
            .revoke_refresh_token(&self.db, &token_hash, user_id)
            .await?
        {
            return Err(CredentialError::InvalidToken {
                token_type: "refresh_token".to_string(),
                reason: "not_found".to_string(),
            }
            .into());
        }

        tracing::info!(request_id = %ctx.request_id, "User {} logged out", user_id);
        Ok(())
    }

    /// Validate a bearer JWT and attach its claims to the context
    ///
    /// Tokens whose token_version no longer matches the user row, or whose
    /// user is gone, are rejected.
    pub async fn authenticate(&self, ctx: RequestContext, token: &str) -> Result<RequestContext, InternalError> {
        let claims = self.token_service.validate_jwt(token)?;

        let account = self.credential_store.find_by_id(&self.db, &claims.sub).await?.ok_or_else(|| {
            CredentialError::InvalidToken {
                token_type: "jwt".to_string(),
                reason: "unknown_subject".to_string(),
            }
        })?;

        if account.token_version != claims.token_version {
            return Err(CredentialError::InvalidToken {
                token_type: "jwt".to_string(),
                reason: "revoked".to_string(),
            }
            .into());
        }

        Ok(ctx.with_claims(claims))
    }

    /// The authenticated caller's account
    pub async fn me(&self, ctx: &RequestContext) -> Result<user::Model, InternalError> {
        let user_id = ctx.require_role(Role::User)?;
        self.credential_store.get_by_id(&self.db, user_id).await
    }

    /// Replace the caller's password
    ///
    /// Clears must_change_password and invalidates every issued token, then
    /// issues a fresh pair so the caller stays signed in.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> Result<TokenPair, InternalError> {
        let user_id = ctx.require_role(Role::User)?;
        self.check_password(new_password)?;

        let txn = self.db.begin().await.map_err(InternalError::transaction_begin)?;
        let account = self.credential_store.get_by_id(&txn, user_id).await?;

        let verified = match account.password_hash.as_deref() {
            Some(hash) => self.credential_store.verify_password(hash, current_password)?,
            None => false,
        };
        if !verified {
            return Err(CredentialError::IncorrectPassword.into());
        }

        let updated = self
            .credential_store
            .update_password(&txn, user_id, new_password, false)
            .await?;
        let tokens = self.issue_tokens(&txn, &updated).await?;
        txn.commit().await.map_err(InternalError::transaction_commit)?;

        tracing::info!(request_id = %ctx.request_id, "User {} changed password", user_id);
        Ok(tokens)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("token_service", &self.token_service)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::setup_test_auth_services;

    fn ctx() -> RequestContext {
        RequestContext::for_cli("test")
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_db, _store, auth) = setup_test_auth_services().await;

        let user = auth.register(&ctx(), "Alice", "Alice@Example.com", "password123").await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::User);

        let (account, tokens) = auth.login(&ctx(), "alice@example.com", "password123").await.unwrap();
        assert_eq!(account.id, user.id);
        assert_eq!(tokens.expires_in, 1800);
        assert_eq!(tokens.refresh_expires_in, 604800);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let (_db, _store, auth) = setup_test_auth_services().await;

        match auth.register(&ctx(), "alice", "a@example.com", "onlyletters").await {
            Err(InternalError::Credential(CredentialError::PasswordValidationFailed(_))) => {}
            other => panic!("Expected PasswordValidationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email_and_missing_fields() {
        let (_db, _store, auth) = setup_test_auth_services().await;

        assert!(matches!(
            auth.register(&ctx(), "alice", "not-an-email", "password123").await,
            Err(InternalError::Credential(CredentialError::InvalidInput(_)))
        ));
        assert!(matches!(
            auth.register(&ctx(), "  ", "a@example.com", "password123").await,
            Err(InternalError::Credential(CredentialError::MissingFields(_)))
        ));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (_db, _store, auth) = setup_test_auth_services().await;
        auth.register(&ctx(), "alice", "a@example.com", "password123").await.unwrap();

        assert!(matches!(
            auth.login(&ctx(), "a@example.com", "password124").await,
            Err(InternalError::Credential(CredentialError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_and_me() {
        let (_db, _store, auth) = setup_test_auth_services().await;
        auth.register(&ctx(), "alice", "a@example.com", "password123").await.unwrap();
        let (_, tokens) = auth.login(&ctx(), "a@example.com", "password123").await.unwrap();

        let authed = auth.authenticate(ctx(), &tokens.access_token).await.unwrap();
        assert!(authed.is_authenticated());

        let me = auth.me(&authed).await.unwrap();
        assert_eq!(me.email, "a@example.com");
        assert!(me.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_change_password_revokes_existing_tokens() {
        let (_db, _store, auth) = setup_test_auth_services().await;
        auth.register(&ctx(), "alice", "a@example.com", "password123").await.unwrap();
        let (_, tokens) = auth.login(&ctx(), "a@example.com", "password123").await.unwrap();
        let authed = auth.authenticate(ctx(), &tokens.access_token).await.unwrap();

        let fresh = auth.change_password(&authed, "password123", "newpassword456").await.unwrap();
        assert!(auth.authenticate(ctx(), &fresh.access_token).await.is_ok());

        assert!(matches!(
            auth.authenticate(ctx(), &tokens.access_token).await,
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
        assert!(auth.refresh(&tokens.refresh_token).await.is_err());
        assert!(auth.login(&ctx(), "a@example.com", "newpassword456").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let (_db, _store, auth) = setup_test_auth_services().await;
        auth.register(&ctx(), "alice", "a@example.com", "password123").await.unwrap();
        let (_, tokens) = auth.login(&ctx(), "a@example.com", "password123").await.unwrap();
        let authed = auth.authenticate(ctx(), &tokens.access_token).await.unwrap();

        assert!(matches!(
            auth.change_password(&authed, "wrong-pass1", "newpassword456").await,
            Err(InternalError::Credential(CredentialError::IncorrectPassword))
        ));
    }

    #[tokio::test]
    async fn test_refresh_and_logout() {
        let (_db, _store, auth) = setup_test_auth_services().await;
        auth.register(&ctx(), "alice", "a@example.com", "password123").await.unwrap();
        let (_, tokens) = auth.login(&ctx(), "a@example.com", "password123").await.unwrap();

        let (access_token, expires_in) = auth.refresh(&tokens.refresh_token).await.unwrap();
        assert_eq!(expires_in, 1800);
        let authed = auth.authenticate(ctx(), &access_token).await.unwrap();

        auth.logout(&authed, &tokens.refresh_token).await.unwrap();
        assert!(matches!(
            auth.refresh(&tokens.refresh_token).await,
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unauthenticated_context_cannot_read_me() {
        let (_db, _store, auth) = setup_test_auth_services().await;
        assert!(matches!(
            auth.me(&ctx()).await,
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
    }
}
