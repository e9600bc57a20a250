use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version, password_hash::SaltString};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::types::db::refresh_token::{self, ActiveModel as RefreshTokenActiveModel, Entity as RefreshToken};
use crate::types::db::user::{self, ActiveModel, Entity as User};
use crate::types::internal::auth::Role;
use crate::types::internal::identity::{Provider, ProviderIdentity};

/// Fields for a new local account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// None for provider-created accounts with no password
    pub password: Option<String>,
    pub role: Role,
    pub must_change_password: bool,
    pub identity: Option<ProviderIdentity>,
}

/// CredentialStore manages user accounts, password hashes and refresh tokens
///
/// Stateless apart from the pepper; every method takes the connection or
/// transaction to run on so callers control atomicity.
pub struct CredentialStore {
    password_pepper: String,
}

/// Emails are matched case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Cheap shape check: one `@`, a non-empty local part and a dotted domain
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

impl CredentialStore {
    /// Create a new CredentialStore
    ///
    /// # Arguments
    /// * `password_pepper` - The secret key used for password hashing (from SecretManager)
    pub fn new(password_pepper: String) -> Self {
        Self { password_pepper }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.password_pepper.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| InternalError::crypto("argon2_init", e.to_string()))
    }

    /// Hash a password with Argon2id using the pepper as secret parameter
    pub fn hash_password(&self, password: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::PasswordHashingFailed(e.to_string()).into())
    }

    /// Check a plaintext password against a stored hash
    pub fn verify_password(&self, password_hash: &str, password: &str) -> Result<bool, InternalError> {
        let parsed_hash = match PasswordHash::new(password_hash) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!("Stored password hash is unreadable: {}", e);
                return Ok(false);
            }
        };
        Ok(self.argon2()?.verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    /// Create a new user
    ///
    /// # Returns
    /// * `Ok(Model)` - The created user
    /// * `Err(CredentialError::EmailExists)` - Email belongs to another account
    /// * `Err(CredentialError::ProviderAlreadyLinked)` - Provider id belongs to another account
    pub async fn create_user(
        &self,
        conn: &impl ConnectionTrait,
        new_user: NewUser,
    ) -> Result<user::Model, InternalError> {
        let email = normalize_email(&new_user.email);

        if self.find_by_email(conn, &email).await?.is_some() {
            return Err(CredentialError::EmailExists.into());
        }

        let password_hash = match &new_user.password {
            Some(password) => Some(self.hash_password(password)?),
            None => None,
        };

        let now = Utc::now().timestamp();
        let identity = new_user.identity.as_ref();
        let github = identity.filter(|i| i.provider == Provider::Github);
        let wechat = identity.filter(|i| i.provider == Provider::Wechat);

        let model = ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(new_user.username),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(new_user.role),
            github_id: Set(github.map(|i| i.provider_id.clone())),
            github_username: Set(github.and_then(|i| i.provider_username.clone())),
            wechat_openid: Set(wechat.map(|i| i.provider_id.clone())),
            must_change_password: Set(new_user.must_change_password),
            token_version: Set(0),
            created_at: Set(now),
            last_login_at: Set(None),
            updated_at: Set(now),
        };

        model.insert(conn).await.map_err(|e| {
            let err = InternalError::database("create_user", e);
            match (&err, identity) {
                // Lost a race with another request inserting the same identity
                (InternalError::Database(db_err), Some(identity)) if db_err.is_unique_violation() => {
                    CredentialError::ProviderAlreadyLinked {
                        provider: identity.provider.to_string(),
                    }
                    .into()
                }
                (InternalError::Database(db_err), None) if db_err.is_unique_violation() => {
                    CredentialError::EmailExists.into()
                }
                _ => err,
            }
        })
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find_by_id(user_id.to_string())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_id", e))
    }

    /// Like `find_by_id` but absence is an error
    pub async fn get_by_id(&self, conn: &impl ConnectionTrait, user_id: &str) -> Result<user::Model, InternalError> {
        self.find_by_id(conn, user_id)
            .await?
            .ok_or_else(|| CredentialError::UserNotFound(user_id.to_string()).into())
    }

    pub async fn find_by_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        User::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_email", e))
    }

    /// Look up the account carrying a provider's unique id
    pub async fn find_by_provider_id(
        &self,
        conn: &impl ConnectionTrait,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        let column = match provider {
            Provider::Github => user::Column::GithubId,
            Provider::Wechat => user::Column::WechatOpenid,
        };

        User::find()
            .filter(column.eq(provider_id))
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_user_by_provider_id", e))
    }

    /// Attach a provider identity to an existing account
    ///
    /// Fails with ProviderAlreadyLinked when the account already carries a
    /// different id for the same provider.
    pub async fn link_provider(
        &self,
        conn: &impl ConnectionTrait,
        account: user::Model,
        identity: &ProviderIdentity,
    ) -> Result<user::Model, InternalError> {
        let existing = match identity.provider {
            Provider::Github => account.github_id.as_deref(),
            Provider::Wechat => account.wechat_openid.as_deref(),
        };

        match existing {
            Some(id) if id == identity.provider_id => return Ok(account),
            Some(_) => {
                return Err(CredentialError::ProviderAlreadyLinked {
                    provider: identity.provider.to_string(),
                }
                .into());
            }
            None => {}
        }

        let mut model = account.into_active_model();
        match identity.provider {
            Provider::Github => {
                model.github_id = Set(Some(identity.provider_id.clone()));
                model.github_username = Set(identity.provider_username.clone());
            }
            Provider::Wechat => {
                model.wechat_openid = Set(Some(identity.provider_id.clone()));
            }
        }
        model.updated_at = Set(Utc::now().timestamp());

        model.update(conn).await.map_err(|e| {
            let err = InternalError::database("link_provider", e);
            match &err {
                InternalError::Database(db_err) if db_err.is_unique_violation() => {
                    CredentialError::ProviderAlreadyLinked {
                        provider: identity.provider.to_string(),
                    }
                    .into()
                }
                _ => err,
            }
        })
    }

    /// Verify email and password and return the account
    ///
    /// Accounts without a password never match.
    pub async fn verify_credentials(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
        password: &str,
    ) -> Result<user::Model, InternalError> {
        let account = self
            .find_by_email(conn, email)
            .await?
            .ok_or(CredentialError::InvalidCredentials)?;

        let Some(password_hash) = account.password_hash.as_deref() else {
            return Err(CredentialError::InvalidCredentials.into());
        };

        if !self.verify_password(password_hash, password)? {
            return Err(CredentialError::InvalidCredentials.into());
        }

        Ok(account)
    }

    /// Stamp last_login_at with the current time
    pub async fn record_login(&self, conn: &impl ConnectionTrait, user_id: &str) -> Result<(), InternalError> {
        User::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(Utc::now().timestamp()))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("record_login", e))?;
        Ok(())
    }

    /// Replace the password and invalidate all issued tokens
    pub async fn update_password(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        new_password: &str,
        must_change_password: bool,
    ) -> Result<user::Model, InternalError> {
        let account = self.get_by_id(conn, user_id).await?;
        let password_hash = self.hash_password(new_password)?;
        let token_version = account.token_version + 1;

        let mut model = account.into_active_model();
        model.password_hash = Set(Some(password_hash));
        model.must_change_password = Set(must_change_password);
        model.token_version = Set(token_version);
        model.updated_at = Set(Utc::now().timestamp());

        let updated = model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("update_password", e))?;

        self.revoke_all_refresh_tokens(conn, user_id).await?;
        Ok(updated)
    }

    /// Change role and invalidate all issued tokens
    pub async fn set_role(
        &self,
        conn: &impl ConnectionTrait,
        account: user::Model,
        role: Role,
    ) -> Result<user::Model, InternalError> {
        let user_id = account.id.clone();
        let token_version = account.token_version + 1;

        let mut model = account.into_active_model();
        model.role = Set(role);
        model.token_version = Set(token_version);
        model.updated_at = Set(Utc::now().timestamp());

        let updated = model
            .update(conn)
            .await
            .map_err(|e| InternalError::database("set_role", e))?;

        self.revoke_all_refresh_tokens(conn, &user_id).await?;
        Ok(updated)
    }

    /// All users ordered by creation
    pub async fn list_users(&self, conn: &impl ConnectionTrait) -> Result<Vec<user::Model>, InternalError> {
        User::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_users", e))
    }

    /// Store a refresh token hash bound to the user's current token_version
    pub async fn store_refresh_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: String,
        account: &user::Model,
        expires_at: i64,
    ) -> Result<(), InternalError> {
        let new_token = RefreshTokenActiveModel {
            token_hash: Set(token_hash),
            user_id: Set(account.id.clone()),
            token_version: Set(account.token_version),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now().timestamp()),
        };

        new_token
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("store_refresh_token", e))?;

        Ok(())
    }

    /// Validate a refresh token and return its owner
    ///
    /// Tokens issued under an older token_version are rejected.
    pub async fn validate_refresh_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
    ) -> Result<user::Model, InternalError> {
        let invalid = || CredentialError::InvalidToken {
            token_type: "refresh_token".to_string(),
            reason: "not_found".to_string(),
        };

        let token = RefreshToken::find_by_id(token_hash.to_string())
            .one(conn)
            .await
            .map_err(|e| InternalError::database("validate_refresh_token", e))?
            .ok_or_else(invalid)?;

        if token.expires_at < Utc::now().timestamp() {
            return Err(CredentialError::ExpiredToken("refresh_token".to_string()).into());
        }

        let account = self.find_by_id(conn, &token.user_id).await?.ok_or_else(invalid)?;

        if account.token_version != token.token_version {
            return Err(CredentialError::InvalidToken {
                token_type: "refresh_token".to_string(),
                reason: "revoked".to_string(),
            }
            .into());
        }

        Ok(account)
    }

    /// Revoke one refresh token, only if it belongs to `user_id`
    pub async fn revoke_refresh_token(
        &self,
        conn: &impl ConnectionTrait,
        token_hash: &str,
        user_id: &str,
    ) -> Result<bool, InternalError> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("revoke_refresh_token", e))?;

        Ok(result.rows_affected > 0)
    }

    /// Revoke every refresh token belonging to a user
    pub async fn revoke_all_refresh_tokens(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<u64, InternalError> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("revoke_refresh_tokens", e))?;

        Ok(result.rows_affected)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("password_pepper", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Display for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialStore {{ password_pepper: <redacted> }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::setup_test_db;

    fn store() -> CredentialStore {
        CredentialStore::new("test-pepper-for-unit-tests".to_string())
    }

    fn new_user(email: &str, password: Option<&str>) -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: email.to_string(),
            password: password.map(str::to_string),
            role: Role::User,
            must_change_password: false,
            identity: None,
        }
    }

    fn github_identity(id: &str) -> ProviderIdentity {
        ProviderIdentity {
            provider: Provider::Github,
            provider_id: id.to_string(),
            provider_username: Some("octocat".to_string()),
            display_name: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() {
        let db = setup_test_db().await;
        let store = store();

        let user = store
            .create_user(&db, new_user("  Alice@Example.COM ", Some("secret-pass-1")))
            .await
            .unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.token_version, 0);
        assert!(store.find_by_email(&db, "ALICE@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_fails() {
        let db = setup_test_db().await;
        let store = store();

        store.create_user(&db, new_user("a@example.com", None)).await.unwrap();
        let result = store.create_user(&db, new_user("A@example.com", None)).await;

        match result {
            Err(InternalError::Credential(CredentialError::EmailExists)) => {}
            other => panic!("Expected EmailExists, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let db = setup_test_db().await;
        let store = store();
        store
            .create_user(&db, new_user("a@example.com", Some("secret-pass-1")))
            .await
            .unwrap();

        assert!(store.verify_credentials(&db, "a@example.com", "secret-pass-1").await.is_ok());

        match store.verify_credentials(&db, "a@example.com", "wrong").await {
            Err(InternalError::Credential(CredentialError::InvalidCredentials)) => {}
            other => panic!("Expected InvalidCredentials, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_passwordless_account_cannot_log_in() {
        let db = setup_test_db().await;
        let store = store();
        store.create_user(&db, new_user("a@example.com", None)).await.unwrap();

        let result = store.verify_credentials(&db, "a@example.com", "").await;
        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_link_provider_sets_id_and_is_idempotent() {
        let db = setup_test_db().await;
        let store = store();
        let account = store.create_user(&db, new_user("a@example.com", None)).await.unwrap();

        let linked = store.link_provider(&db, account, &github_identity("42")).await.unwrap();
        assert_eq!(linked.github_id.as_deref(), Some("42"));
        assert_eq!(linked.github_username.as_deref(), Some("octocat"));

        let again = store.link_provider(&db, linked, &github_identity("42")).await.unwrap();
        assert_eq!(again.github_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_link_provider_conflicts_with_different_id() {
        let db = setup_test_db().await;
        let store = store();
        let account = store.create_user(&db, new_user("a@example.com", None)).await.unwrap();
        let linked = store.link_provider(&db, account, &github_identity("42")).await.unwrap();

        match store.link_provider(&db, linked, &github_identity("99")).await {
            Err(InternalError::Credential(CredentialError::ProviderAlreadyLinked { provider })) => {
                assert_eq!(provider, "github");
            }
            other => panic!("Expected ProviderAlreadyLinked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_after_token_version_bump() {
        let db = setup_test_db().await;
        let store = store();
        let account = store
            .create_user(&db, new_user("a@example.com", Some("secret-pass-1")))
            .await
            .unwrap();

        let expires_at = Utc::now().timestamp() + 3600;
        store
            .store_refresh_token(&db, "hash-1".to_string(), &account, expires_at)
            .await
            .unwrap();
        assert!(store.validate_refresh_token(&db, "hash-1").await.is_ok());

        store.set_role(&db, account, Role::Admin).await.unwrap();

        assert!(matches!(
            store.validate_refresh_token(&db, "hash-1").await,
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let db = setup_test_db().await;
        let store = store();
        let account = store.create_user(&db, new_user("a@example.com", None)).await.unwrap();

        store
            .store_refresh_token(&db, "hash-old".to_string(), &account, Utc::now().timestamp() - 10)
            .await
            .unwrap();

        assert!(matches!(
            store.validate_refresh_token(&db, "hash-old").await,
            Err(InternalError::Credential(CredentialError::ExpiredToken(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_password_bumps_token_version() {
        let db = setup_test_db().await;
        let store = store();
        let account = store
            .create_user(&db, new_user("a@example.com", Some("secret-pass-1")))
            .await
            .unwrap();

        let updated = store
            .update_password(&db, &account.id, "another-pass-2", true)
            .await
            .unwrap();

        assert_eq!(updated.token_version, 1);
        assert!(updated.must_change_password);
        assert!(store.verify_credentials(&db, "a@example.com", "another-pass-2").await.is_ok());
    }

    #[test]
    fn test_is_plausible_email() {
        assert!(is_plausible_email("alice@example.com"));
        assert!(is_plausible_email("  bob@mail.example.org "));
        assert!(!is_plausible_email("alice"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("alice@localhost"));
        assert!(!is_plausible_email("a@b@example.com"));
        assert!(!is_plausible_email("al ice@example.com"));
    }

    #[test]
    fn test_debug_redacts_pepper() {
        let debug = format!("{:?}", store());
        assert!(!debug.contains("test-pepper"));
    }
}
