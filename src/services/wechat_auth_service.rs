use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::errors::InternalError;
use crate::errors::internal::{CredentialError, OAuthError};
use crate::services::AuthService;
use crate::services::crypto::generate_url_token;
use crate::services::identity_resolver::{EmailMatch, IdentityResolver};
use crate::services::oauth::WechatApi;
use crate::stores::{DEFAULT_STATE_TTL, StateStore};
use crate::types::db::user;
use crate::types::internal::auth::TokenPair;
use crate::types::internal::identity::{NewAccount, Provider, ProviderIdentity, Resolution, WechatState};

const STATE_PREFIX: &str = "wechat:state:";

/// Result of a WeChat code exchange
#[derive(Debug)]
pub enum WechatCallbackOutcome {
    ExistingUser { user: user::Model, tokens: TokenPair },
    /// No local account carries the openid; `state` now holds it for `bind`
    NewUser { state: String, nickname: Option<String> },
}

/// Fields submitted to create the account for a pending WeChat identity
#[derive(Debug, Clone)]
pub struct BindRequest {
    pub state: String,
    pub username: String,
    pub email: String,
    pub password: Option<String>,
}

/// WeChat QR login: state issuance, callback and explicit account binding
pub struct WechatAuthService {
    db: DatabaseConnection,
    api: Option<Arc<dyn WechatApi>>,
    state_store: Arc<dyn StateStore>,
    resolver: Arc<IdentityResolver>,
    auth_service: Arc<AuthService>,
}

fn state_key(state: &str) -> String {
    format!("{STATE_PREFIX}{state}")
}

fn encode_state(state: &WechatState) -> Result<serde_json::Value, InternalError> {
    serde_json::to_value(state).map_err(|e| InternalError::parse("wechat_state", e.to_string()))
}

impl WechatAuthService {
    pub fn new(
        db: DatabaseConnection,
        api: Option<Arc<dyn WechatApi>>,
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

    fn api(&self) -> Result<&Arc<dyn WechatApi>, InternalError> {
        self.api.as_ref().ok_or_else(|| {
            OAuthError::NotConfigured {
                provider: "wechat".to_string(),
            }
            .into()
        })
    }

    /// Issue a state and return `(qrcode_url, state)`
    pub async fn begin_login(&self) -> Result<(String, String), InternalError> {
        let api = self.api()?;
        let state = generate_url_token(32);
        self.state_store
            .set(&state_key(&state), encode_state(&WechatState::Issued)?, DEFAULT_STATE_TTL)
            .await?;
        Ok((api.qrcode_url(&state), state))
    }

    /// Consume an issued state and exchange the code
    ///
    /// Known openids sign in directly. Unknown ones re-arm the same state
    /// with the openid so the client can call `bind`.
    pub async fn handle_callback(&self, code: &str, state: &str) -> Result<WechatCallbackOutcome, InternalError> {
        if code.trim().is_empty() || state.trim().is_empty() {
            return Err(OAuthError::MissingCodeOrState.into());
        }
        let api = self.api()?;

        let stored = self.state_store.take(&state_key(state)).await?;
        match stored.map(serde_json::from_value::<WechatState>) {
            Some(Ok(WechatState::Issued)) => {}
            _ => {
                tracing::warn!("WeChat callback with unknown, replayed or already exchanged state");
                return Err(OAuthError::InvalidState.into());
            }
        }

        let token = api.exchange_code(code).await?;
        let nickname = match api.fetch_user_info(&token.access_token, &token.openid).await {
            Ok(info) => info.nickname.filter(|n| !n.is_empty()),
            Err(err) => {
                tracing::warn!("WeChat userinfo unavailable for {}: {}", token.openid, err);
                None
            }
        };

        if let Some(user) = self.resolver.login_linked(Provider::Wechat, &token.openid).await? {
            let tokens = self.auth_service.issue_tokens(&self.db, &user).await?;
            return Ok(WechatCallbackOutcome::ExistingUser { user, tokens });
        }

        let pending = WechatState::PendingBind {
            openid: token.openid,
            nickname: nickname.clone(),
        };
        self.state_store
            .set(&state_key(state), encode_state(&pending)?, DEFAULT_STATE_TTL)
            .await?;

        Ok(WechatCallbackOutcome::NewUser {
            state: state.to_string(),
            nickname,
        })
    }

    /// Create (or find) the account for a pending openid and sign it in
    ///
    /// Returns the account, its tokens and whether it was newly created.
    /// An email that already has an account is refused rather than linked.
    pub async fn bind(&self, request: BindRequest) -> Result<(user::Model, TokenPair, bool), InternalError> {
        let BindRequest {
            state,
            username,
            email,
            password,
        } = request;

        if state.trim().is_empty() || username.trim().is_empty() || email.trim().is_empty() {
            return Err(CredentialError::MissingFields("state, username, email".to_string()).into());
        }
        self.auth_service.check_account_fields(&username, &email)?;
        let password = password.filter(|p| !p.is_empty());
        if let Some(password) = &password {
            self.auth_service.check_password(password)?;
        }

        let stored = self.state_store.take(&state_key(&state)).await?;
        let (openid, nickname) = match stored.map(serde_json::from_value::<WechatState>) {
            Some(Ok(WechatState::PendingBind { openid, nickname })) => (openid, nickname),
            _ => return Err(OAuthError::InvalidState.into()),
        };

        let identity = ProviderIdentity {
            provider: Provider::Wechat,
            provider_id: openid,
            provider_username: None,
            display_name: nickname,
            email: Some(email.clone()),
        };
        let account = NewAccount {
            username: username.trim().to_string(),
            email,
            password,
        };

        let resolution = self.resolver.resolve(&identity, account, EmailMatch::Reject).await?;
        let created = matches!(resolution, Resolution::Created(_));
        let user = resolution.into_user();
        let tokens = self.auth_service.issue_tokens(&self.db, &user).await?;

        Ok((user, tokens, created))
    }
}

impl std::fmt::Debug for WechatAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatAuthService")
            .field("configured", &self.api.is_some())
            .finish_non_exhaustive()
    }
}
