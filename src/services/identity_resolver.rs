use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use crate::errors::InternalError;
use crate::errors::internal::CredentialError;
use crate::stores::{CredentialStore, NewUser};
use crate::types::db::user;
use crate::types::internal::auth::Role;
use crate::types::internal::identity::{NewAccount, Provider, ProviderIdentity, Resolution};

/// What to do when the email of a new identity already has an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailMatch {
    /// Attach the provider id to that account
    Link,
    /// Refuse with EmailExists; the owner has to sign in and link instead
    Reject,
}

/// Maps a provider identity onto exactly one local account
///
/// Precedence: the account already carrying the provider id, then the
/// account owning the email (which gets the id linked), then a new account.
pub struct IdentityResolver {
    db: DatabaseConnection,
    credential_store: Arc<CredentialStore>,
}

impl IdentityResolver {
    pub fn new(db: DatabaseConnection, credential_store: Arc<CredentialStore>) -> Self {
        Self { db, credential_store }
    }

    /// Account already linked to this provider id, if any
    pub async fn find_linked(&self, provider: Provider, provider_id: &str) -> Result<Option<user::Model>, InternalError> {
        self.credential_store
            .find_by_provider_id(&self.db, provider, provider_id)
            .await
    }

    /// Sign in the account linked to this provider id, stamping last_login_at
    pub async fn login_linked(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<user::Model>, InternalError> {
        let Some(account) = self.find_linked(provider, provider_id).await? else {
            return Ok(None);
        };
        self.credential_store.record_login(&self.db, &account.id).await?;
        Ok(Some(account))
    }

    /// Resolve `identity`, creating an account from `account` when needed
    ///
    /// The lookup, link and create steps share one transaction.
    pub async fn resolve(
        &self,
        identity: &ProviderIdentity,
        account: NewAccount,
        email_match: EmailMatch,
    ) -> Result<Resolution, InternalError> {
        let txn = self.db.begin().await.map_err(InternalError::transaction_begin)?;
        let resolution = self.resolve_in(&txn, identity, account, email_match).await?;
        self.credential_store.record_login(&txn, &resolution.user().id).await?;
        txn.commit().await.map_err(InternalError::transaction_commit)?;

        match &resolution {
            Resolution::Existing(user) => {
                tracing::debug!("{} identity {} matched user {}", identity.provider, identity.provider_id, user.id)
            }
            Resolution::Linked(user) => {
                tracing::info!("Linked {} identity {} to user {}", identity.provider, identity.provider_id, user.id)
            }
            Resolution::Created(user) => {
                tracing::info!("Created user {} from {} identity {}", user.id, identity.provider, identity.provider_id)
            }
        }

        Ok(resolution)
    }

    async fn resolve_in(
        &self,
        conn: &impl ConnectionTrait,
        identity: &ProviderIdentity,
        account: NewAccount,
        email_match: EmailMatch,
    ) -> Result<Resolution, InternalError> {
        if let Some(existing) = self
            .credential_store
            .find_by_provider_id(conn, identity.provider, &identity.provider_id)
            .await?
        {
            return Ok(Resolution::Existing(existing));
        }

        if let Some(owner) = self.credential_store.find_by_email(conn, &account.email).await? {
            if email_match == EmailMatch::Reject {
                return Err(CredentialError::EmailExists.into());
            }
            let linked = self.credential_store.link_provider(conn, owner, identity).await?;
            return Ok(Resolution::Linked(linked));
        }

        let created = self
            .credential_store
            .create_user(
                conn,
                NewUser {
                    username: account.username,
                    email: account.email,
                    password: account.password,
                    role: Role::User,
                    must_change_password: false,
                    identity: Some(identity.clone()),
                },
            )
            .await?;

        Ok(Resolution::Created(created))
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}
