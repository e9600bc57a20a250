// Common test utilities for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use healthtrack_backend::errors::InternalError;
use healthtrack_backend::errors::internal::OAuthError;
use healthtrack_backend::services::oauth::{
    GithubApi, GithubEmail, GithubProfile, WechatAccessToken, WechatApi, WechatUserInfo,
};
use healthtrack_backend::services::{
    AuthService, GithubAuthService, IdentityResolver, ThresholdService, TokenService, WechatAuthService,
};
use healthtrack_backend::stores::{CredentialStore, InMemoryStateStore, NewUser, StateStore};
use healthtrack_backend::types::db::user;
use healthtrack_backend::types::internal::auth::Role;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

pub const TEST_PEPPER: &str = "integration-test-pepper";
pub const TEST_JWT_SECRET: &str = "integration-test-jwt-secret-at-least-32-chars";
pub const TEST_REFRESH_SECRET: &str = "integration-test-refresh-secret-at-least-32";
pub const TEST_PASSWORD: &str = "password123";

/// Creates an in-memory database with all migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None).await.expect("Failed to run migrations");

    db
}

/// Every service wired over one database, with fake identity providers
pub struct TestApp {
    pub db: DatabaseConnection,
    pub credential_store: Arc<CredentialStore>,
    pub state_store: Arc<dyn StateStore>,
    pub auth_service: Arc<AuthService>,
    pub threshold_service: Arc<ThresholdService>,
    pub github: Arc<FakeGithub>,
    pub github_service: Arc<GithubAuthService>,
    pub wechat: Arc<FakeWechat>,
    pub wechat_service: Arc<WechatAuthService>,
}

pub async fn setup_test_app() -> TestApp {
    let db = setup_test_db().await;
    let state_store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    setup_test_app_with(db, state_store)
}

pub fn setup_test_app_with(db: DatabaseConnection, state_store: Arc<dyn StateStore>) -> TestApp {
    let credential_store = Arc::new(CredentialStore::new(TEST_PEPPER.to_string()));
    let token_service = Arc::new(TokenService::new(
        TEST_JWT_SECRET.to_string(),
        TEST_REFRESH_SECRET.to_string(),
    ));
    let auth_service = Arc::new(AuthService::new(db.clone(), credential_store.clone(), token_service));
    let threshold_service = Arc::new(ThresholdService::new(db.clone(), credential_store.clone()));
    let resolver = Arc::new(IdentityResolver::new(db.clone(), credential_store.clone()));

    let github = Arc::new(FakeGithub::default());
    let github_service = Arc::new(GithubAuthService::new(
        db.clone(),
        Some(github.clone() as Arc<dyn GithubApi>),
        state_store.clone(),
        resolver.clone(),
        auth_service.clone(),
    ));

    let wechat = Arc::new(FakeWechat::default());
    let wechat_service = Arc::new(WechatAuthService::new(
        db.clone(),
        Some(wechat.clone() as Arc<dyn WechatApi>),
        state_store.clone(),
        resolver,
        auth_service.clone(),
    ));

    TestApp {
        db,
        credential_store,
        state_store,
        auth_service,
        threshold_service,
        github,
        github_service,
        wechat,
        wechat_service,
    }
}

/// Creates a password account with the given role
pub async fn create_user(app: &TestApp, email: &str, role: Role) -> user::Model {
    let username = email.split('@').next().unwrap_or(email).to_string();
    app.credential_store
        .create_user(
            &app.db,
            NewUser {
                username,
                email: email.to_string(),
                password: Some(TEST_PASSWORD.to_string()),
                role,
                must_change_password: false,
                identity: None,
            },
        )
        .await
        .expect("Failed to create test user")
}

/// Pull the state parameter back out of a provider URL
pub fn state_from_url(url: &str) -> String {
    let (_, query) = url.split_once('?').expect("URL has no query");
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("state="))
        .map(|s| urlencoding::decode(s).expect("state is not valid UTF-8").into_owned())
        .expect("URL has no state parameter")
}

/// GitHub stand-in keyed by authorization code
#[derive(Default)]
pub struct FakeGithub {
    profiles: Mutex<HashMap<String, (GithubProfile, Vec<GithubEmail>)>>,
}

impl FakeGithub {
    pub fn add_user(&self, code: &str, id: i64, login: &str, public_email: Option<&str>, emails: Vec<GithubEmail>) {
        let profile = GithubProfile {
            id,
            login: login.to_string(),
            name: None,
            email: public_email.map(str::to_string),
        };
        self.profiles
            .lock()
            .unwrap()
            .insert(code.to_string(), (profile, emails));
    }
}

#[async_trait]
impl GithubApi for FakeGithub {
    async fn exchange_code(&self, code: &str) -> Result<String, InternalError> {
        if self.profiles.lock().unwrap().contains_key(code) {
            Ok(code.to_string())
        } else {
            Err(OAuthError::upstream("github", "bad_verification_code").into())
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GithubProfile, InternalError> {
        self.profiles
            .lock()
            .unwrap()
            .get(access_token)
            .map(|(profile, _)| profile.clone())
            .ok_or_else(|| OAuthError::upstream("github", "unknown token").into())
    }

    async fn fetch_emails(&self, access_token: &str) -> Result<Vec<GithubEmail>, InternalError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(access_token)
            .map(|(_, emails)| emails.clone())
            .unwrap_or_default())
    }

    fn authorize_url(&self, state: &str) -> String {
        format!("https://github.test/login/oauth/authorize?client_id=test&state={}", state)
    }
}

/// WeChat stand-in keyed by authorization code
#[derive(Default)]
pub struct FakeWechat {
    openids: Mutex<HashMap<String, (String, Option<String>)>>,
}

impl FakeWechat {
    pub fn add_user(&self, code: &str, openid: &str, nickname: Option<&str>) {
        self.openids
            .lock()
            .unwrap()
            .insert(code.to_string(), (openid.to_string(), nickname.map(str::to_string)));
    }
}

#[async_trait]
impl WechatApi for FakeWechat {
    async fn exchange_code(&self, code: &str) -> Result<WechatAccessToken, InternalError> {
        let openids = self.openids.lock().unwrap();
        let (openid, _) = openids
            .get(code)
            .ok_or_else(|| InternalError::from(OAuthError::upstream("wechat", "errcode 40029")))?;
        Ok(WechatAccessToken {
            access_token: format!("token-{}", code),
            openid: openid.clone(),
            unionid: None,
        })
    }

    async fn fetch_user_info(&self, _access_token: &str, openid: &str) -> Result<WechatUserInfo, InternalError> {
        let nickname = self
            .openids
            .lock()
            .unwrap()
            .values()
            .find(|(id, _)| id == openid)
            .and_then(|(_, nickname)| nickname.clone());
        Ok(WechatUserInfo {
            openid: openid.to_string(),
            nickname,
            headimgurl: None,
            unionid: None,
        })
    }

    fn qrcode_url(&self, state: &str) -> String {
        format!("https://wechat.test/connect/qrconnect?appid=test&state={}#wechat_redirect", state)
    }
}
