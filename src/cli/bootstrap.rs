// Bootstrap command implementation
// Creates the first SUPER_ADMIN and makes sure a threshold configuration is active

use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::services::crypto::generate_secure_password;
use crate::services::{AuthService, ThresholdService};
use crate::stores::{CredentialStore, NewUser};
use crate::types::db::user;
use crate::types::internal::auth::Role;
use crate::types::internal::context::RequestContext;

/// Length of the generated initial password
const INITIAL_PASSWORD_LENGTH: usize = 16;

/// Create a SUPER_ADMIN with a generated password and seed the default thresholds
///
/// Returns the account and its one-time password. Fails with EmailExists
/// when the email is taken.
pub async fn create_super_admin(
    app_data: &AppData,
    username: &str,
    email: &str,
) -> Result<(user::Model, String), InternalError> {
    create_super_admin_with(
        &app_data.db,
        &app_data.credential_store,
        &app_data.auth_service,
        &app_data.threshold_service,
        username,
        email,
    )
    .await
}

async fn create_super_admin_with(
    db: &sea_orm::DatabaseConnection,
    credential_store: &CredentialStore,
    auth_service: &AuthService,
    threshold_service: &ThresholdService,
    username: &str,
    email: &str,
) -> Result<(user::Model, String), InternalError> {
    let ctx = RequestContext::for_cli("bootstrap");
    auth_service.check_account_fields(username, email)?;

    let password = generate_secure_password(INITIAL_PASSWORD_LENGTH);
    let account = credential_store
        .create_user(
            db,
            NewUser {
                username: username.trim().to_string(),
                email: email.to_string(),
                password: Some(password.clone()),
                role: Role::SuperAdmin,
                must_change_password: true,
                identity: None,
            },
        )
        .await?;
    tracing::info!(request_id = %ctx.request_id, "Created SUPER_ADMIN {}", account.id);

    let active = threshold_service.ensure_default_config(Some(&account.id)).await?;
    tracing::info!("Active threshold configuration is version {}", active.version);

    Ok((account, password))
}

/// CLI entry point: create the account and print its credentials once
pub async fn bootstrap_system(
    app_data: &AppData,
    username: &str,
    email: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== HealthTrack Bootstrap ===\n");

    let (account, password) = create_super_admin(app_data, username, email).await?;

    println!("SUPER_ADMIN account created");
    println!("  id:       {}", account.id);
    println!("  email:    {}", account.email);
    println!("  password: {}", password);
    println!("\nThis password is shown only once and must be changed at first login.");

    Ok(())
}
