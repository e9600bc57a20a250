// Application wiring from configuration, as main does it

mod common;

use std::sync::Arc;

use common::setup_test_db;
use healthtrack_backend::app_data::AppData;
use healthtrack_backend::cli::bootstrap::create_super_admin;
use healthtrack_backend::config::{BootstrapSettings, EnvironmentProvider, SecretError, SecretManager, StaticEnvironment};
use healthtrack_backend::types::internal::auth::Role;

const SECRETS: [(&str, &str); 3] = [
    ("JWT_SECRET", "this-is-a-valid-jwt-secret-with-32-characters"),
    ("PASSWORD_PEPPER", "valid-pepper-16ch"),
    ("REFRESH_TOKEN_SECRET", "this-is-a-valid-refresh-token-secret-32"),
];

fn env(extra: &[(&str, &str)]) -> Arc<dyn EnvironmentProvider> {
    Arc::new(StaticEnvironment::empty().with_vars(&SECRETS).with_vars(extra))
}

#[tokio::test]
async fn test_startup_with_providers_disabled() {
    let env = env(&[("STATE_BACKEND", "memory")]);
    let settings = BootstrapSettings::from_env_provider(env.clone()).unwrap();

    let app = AppData::init(setup_test_db().await, &settings, env).await.unwrap();

    assert_eq!(app.secret_manager.password_pepper(), "valid-pepper-16ch");
    assert!(app.github_auth_service.begin_login().await.is_err());
    assert!(app.wechat_auth_service.begin_login().await.is_err());
}

#[tokio::test]
async fn test_startup_with_github_configured() {
    let env = env(&[
        ("GITHUB_CLIENT_ID", "client-id"),
        ("GITHUB_CLIENT_SECRET", "client-secret"),
        ("GITHUB_REDIRECT_URI", "http://localhost:3000/api/auth/github/callback"),
    ]);
    let settings = BootstrapSettings::from_env_provider(env.clone()).unwrap();

    let app = AppData::init(setup_test_db().await, &settings, env).await.unwrap();

    let url = app.github_auth_service.begin_login().await.unwrap();
    assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
    assert!(url.contains("client_id=client-id"));
}

#[tokio::test]
async fn test_startup_fails_without_client_secret() {
    let env = env(&[("GITHUB_CLIENT_ID", "client-id")]);
    let settings = BootstrapSettings::from_env_provider(env.clone()).unwrap();

    assert!(AppData::init(setup_test_db().await, &settings, env).await.is_err());
}

#[test]
fn test_missing_jwt_secret_is_reported_by_name() {
    let env: Arc<dyn EnvironmentProvider> =
        Arc::new(StaticEnvironment::empty().with_vars(&SECRETS[1..]));

    match SecretManager::from_env_provider(env) {
        Err(SecretError::Missing { secret_name }) => assert_eq!(secret_name, "JWT_SECRET"),
        other => panic!("Expected Missing, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_short_pepper_is_rejected() {
    let env: Arc<dyn EnvironmentProvider> = Arc::new(
        StaticEnvironment::empty()
            .with_vars(&SECRETS)
            .with_var("PASSWORD_PEPPER", "short"),
    );

    match SecretManager::from_env_provider(env) {
        Err(SecretError::InvalidLength { secret_name, expected, actual }) => {
            assert_eq!(secret_name, "PASSWORD_PEPPER");
            assert_eq!(expected, 16);
            assert_eq!(actual, 5);
        }
        other => panic!("Expected InvalidLength, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_bootstrap_creates_super_admin_and_active_thresholds() {
    let env = env(&[]);
    let settings = BootstrapSettings::from_env_provider(env.clone()).unwrap();
    let app = AppData::init(setup_test_db().await, &settings, env).await.unwrap();

    let (account, password) = create_super_admin(&app, "root", "root@example.com").await.unwrap();

    assert_eq!(account.role, Role::SuperAdmin);
    assert!(account.must_change_password);
    assert!(
        app.credential_store
            .verify_credentials(&app.db, "root@example.com", &password)
            .await
            .is_ok()
    );
    assert!(app.threshold_service.get_active().await.unwrap().id.is_some());
}
