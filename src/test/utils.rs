// Test utilities shared across unit tests
// Only compiled when running tests

use std::sync::Arc;

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use crate::services::{AuthService, TokenService};
use crate::stores::{CredentialStore, NewUser};
use crate::types::db::user;
use crate::types::internal::auth::{Claims, Role};
use crate::types::internal::context::RequestContext;

pub const TEST_PEPPER: &str = "test-pepper-for-unit-tests";
pub const TEST_JWT_SECRET: &str = "test-secret-key-minimum-32-characters-long";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret-minimum-32-chars";
pub const TEST_PASSWORD: &str = "password123";

/// Fresh in-memory database with all migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Creates a full auth test setup
///
/// Returns (db, credential_store, auth_service). No users exist yet.
///
/// Callers can discard what they don't need:
/// ```rust
/// let (_db, _store, auth) = setup_test_auth_services().await;
/// ```
pub async fn setup_test_auth_services() -> (DatabaseConnection, Arc<CredentialStore>, Arc<AuthService>) {
    let db = setup_test_db().await;
    let credential_store = Arc::new(CredentialStore::new(TEST_PEPPER.to_string()));
    let token_service = Arc::new(TokenService::new(
        TEST_JWT_SECRET.to_string(),
        TEST_REFRESH_SECRET.to_string(),
    ));
    let auth_service = Arc::new(AuthService::new(db.clone(), credential_store.clone(), token_service));

    (db, credential_store, auth_service)
}

/// Insert a password account with `TEST_PASSWORD`
///
/// The username is the local part of `email`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    credential_store: &CredentialStore,
    email: &str,
    role: Role,
) -> user::Model {
    let username = email.split('@').next().unwrap_or(email).to_string();

    credential_store
        .create_user(
            db,
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

/// Authenticated context for `account` without going through a JWT
pub fn context_for(account: &user::Model) -> RequestContext {
    let now = Utc::now().timestamp();
    RequestContext::for_cli("test").with_claims(Claims {
        sub: account.id.clone(),
        role: account.role,
        token_version: account.token_version,
        exp: now + 1800,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    })
}
