use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::{BootstrapSettings, EnvironmentProvider, OAuthSettings, SecretManager, StateBackend};
use crate::errors::InternalError;
use crate::services::oauth::{GithubApi, GithubClient, WechatApi, WechatClient};
use crate::services::{
    AdminService, AuthService, GithubAuthService, IdentityResolver, ThresholdService, TokenService, WechatAuthService,
};
use crate::stores::{CredentialStore, DatabaseStateStore, InMemoryStateStore, StateStore};

/// Centralized application data following the main-owned stores pattern
///
/// Everything is created once in main.rs and shared with the API layer and
/// the CLI.
///
/// ```text
/// main.rs
///   ↓
/// AppData::init()
///   ↓ creates once
///   ├─ db (DatabaseConnection)
///   ├─ secret_manager
///   ├─ credential_store, state_store
///   ├─ token_service → auth_service
///   ├─ identity_resolver → github_auth_service, wechat_auth_service
///   └─ admin_service, threshold_service
/// ```
pub struct AppData {
    pub db: DatabaseConnection,
    pub secret_manager: Arc<SecretManager>,
    pub credential_store: Arc<CredentialStore>,
    pub state_store: Arc<dyn StateStore>,
    pub token_service: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub admin_service: Arc<AdminService>,
    pub threshold_service: Arc<ThresholdService>,
    pub identity_resolver: Arc<IdentityResolver>,
    pub github_auth_service: Arc<GithubAuthService>,
    pub wechat_auth_service: Arc<WechatAuthService>,
}

impl AppData {
    /// Initialize all application data
    ///
    /// The database should be connected and migrated before calling this.
    ///
    /// # Errors
    ///
    /// Returns `InternalError` when secrets or provider settings are invalid
    pub async fn init(
        db: DatabaseConnection,
        settings: &BootstrapSettings,
        env_provider: Arc<dyn EnvironmentProvider>,
    ) -> Result<Self, InternalError> {
        tracing::info!("Initializing AppData...");

        let secret_manager = Arc::new(
            SecretManager::from_env_provider(env_provider.clone())
                .map_err(|e| InternalError::parse("secret_manager", format!("Secret manager init failed: {}", e)))?,
        );
        let oauth_settings = OAuthSettings::from_env_provider(env_provider)
            .map_err(|e| InternalError::parse("oauth_settings", e.to_string()))?;

        tracing::debug!("Creating stores...");
        let credential_store = Arc::new(CredentialStore::new(secret_manager.password_pepper().to_string()));
        let state_store: Arc<dyn StateStore> = match settings.state_backend() {
            StateBackend::Database => Arc::new(DatabaseStateStore::new(db.clone())),
            StateBackend::Memory => {
                tracing::warn!("Using in-memory OAuth state store; not safe with several worker processes");
                Arc::new(InMemoryStateStore::new())
            }
        };

        let github_api: Option<Arc<dyn GithubApi>> = match oauth_settings.github {
            Some(github) => Some(Arc::new(GithubClient::new(github)?)),
            None => {
                tracing::info!("GitHub login disabled: GITHUB_CLIENT_ID not set");
                None
            }
        };
        let wechat_api: Option<Arc<dyn WechatApi>> = match oauth_settings.wechat {
            Some(wechat) => Some(Arc::new(WechatClient::new(wechat)?)),
            None => {
                tracing::info!("WeChat login disabled: WECHAT_APP_ID not set");
                None
            }
        };

        tracing::debug!("Creating services...");
        let token_service = Arc::new(TokenService::new(
            secret_manager.jwt_secret().to_string(),
            secret_manager.refresh_token_secret().to_string(),
        ));
        let auth_service = Arc::new(AuthService::new(
            db.clone(),
            credential_store.clone(),
            token_service.clone(),
        ));
        let admin_service = Arc::new(AdminService::new(db.clone(), credential_store.clone()));
        let threshold_service = Arc::new(ThresholdService::new(db.clone(), credential_store.clone()));
        let identity_resolver = Arc::new(IdentityResolver::new(db.clone(), credential_store.clone()));

        let github_auth_service = Arc::new(GithubAuthService::new(
            db.clone(),
            github_api,
            state_store.clone(),
            identity_resolver.clone(),
            auth_service.clone(),
        ));
        let wechat_auth_service = Arc::new(WechatAuthService::new(
            db.clone(),
            wechat_api,
            state_store.clone(),
            identity_resolver.clone(),
            auth_service.clone(),
        ));

        tracing::info!("AppData initialization complete");

        Ok(Self {
            db,
            secret_manager,
            credential_store,
            state_store,
            token_service,
            auth_service,
            admin_service,
            threshold_service,
            identity_resolver,
            github_auth_service,
            wechat_auth_service,
        })
    }
}
