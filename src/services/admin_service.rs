use std::sync::Arc;

use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::services::crypto::generate_secure_password;
use crate::stores::CredentialStore;
use crate::types::db::user;
use crate::types::internal::auth::Role;
use crate::types::internal::context::RequestContext;

/// Length of generated temporary passwords
const TEMP_PASSWORD_LENGTH: usize = 12;

/// Admin service for user listing, role changes and password resets
///
/// Every operation checks the caller's role from the request context
/// before touching the database. Role and password changes bump the
/// target's token_version, so the target must sign in again.
pub struct AdminService {
    db: DatabaseConnection,
    credential_store: Arc<CredentialStore>,
}

impl AdminService {
    pub fn new(db: DatabaseConnection, credential_store: Arc<CredentialStore>) -> Self {
        Self { db, credential_store }
    }

    /// All accounts; ADMIN or above
    pub async fn list_users(&self, ctx: &RequestContext) -> Result<Vec<user::Model>, InternalError> {
        ctx.require_role(Role::Admin)?;
        self.credential_store.list_users(&self.db).await
    }

    /// Grant ADMIN to a USER; SUPER_ADMIN only
    pub async fn promote_admin(&self, ctx: &RequestContext, target_user_id: &str) -> Result<user::Model, InternalError> {
        self.change_role(ctx, target_user_id, Role::Admin).await
    }

    /// Return an ADMIN to USER; SUPER_ADMIN only
    pub async fn demote_admin(&self, ctx: &RequestContext, target_user_id: &str) -> Result<user::Model, InternalError> {
        self.change_role(ctx, target_user_id, Role::User).await
    }

    async fn change_role(
        &self,
        ctx: &RequestContext,
        target_user_id: &str,
        role: Role,
    ) -> Result<user::Model, InternalError> {
        let operator_id = ctx.require_role(Role::SuperAdmin)?;

        let txn = self.db.begin().await.map_err(InternalError::transaction_begin)?;
        let target = self.credential_store.get_by_id(&txn, target_user_id).await?;

        // SUPER_ADMIN is only ever assigned from the CLI
        if target.role == Role::SuperAdmin {
            return Err(CredentialError::ProtectedRole.into());
        }

        let previous = target.role;
        let updated = self.credential_store.set_role(&txn, target, role).await?;
        txn.commit().await.map_err(InternalError::transaction_commit)?;

        tracing::info!(
            request_id = %ctx.request_id,
            "Role of user {} changed from {} to {} by {}",
            target_user_id,
            previous,
            role,
            operator_id
        );

        Ok(updated)
    }

    /// Replace another user's password with a generated temporary one
    ///
    /// The target must change it at next login. Returns the temporary
    /// password; it is not stored anywhere in clear.
    pub async fn reset_password(&self, ctx: &RequestContext, target_user_id: &str) -> Result<String, InternalError> {
        let operator_id = ctx.require_role(Role::Admin)?;
        if operator_id == target_user_id {
            return Err(CredentialError::SelfResetDenied.into());
        }

        let txn = self.db.begin().await.map_err(InternalError::transaction_begin)?;
        self.credential_store.get_by_id(&txn, target_user_id).await?;

        let temp_password = generate_secure_password(TEMP_PASSWORD_LENGTH);
        self.credential_store
            .update_password(&txn, target_user_id, &temp_password, true)
            .await?;
        txn.commit().await.map_err(InternalError::transaction_commit)?;

        tracing::info!(
            request_id = %ctx.request_id,
            "Password of user {} reset by {}",
            target_user_id,
            operator_id
        );

        Ok(temp_password)
    }
}

impl std::fmt::Debug for AdminService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminService").finish_non_exhaustive()
    }
}
