use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::Value;

use crate::errors::InternalError;
use crate::types::db::oauth_state::{self, ActiveModel, Entity as OAuthState};

/// Lifetime of an OAuth state entry unless the caller asks otherwise
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// Short-lived key/value entries used as OAuth CSRF nonces and pending
/// registration stashes
///
/// `get` never returns an expired entry. `take` is the one-time read used
/// when validating a state: at most one caller receives the value.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), InternalError>;

    async fn get(&self, key: &str) -> Result<Option<Value>, InternalError>;

    /// Returns true when an entry was removed
    async fn delete(&self, key: &str) -> Result<bool, InternalError>;

    /// Drop expired entries, returning how many were removed
    async fn cleanup_expired(&self) -> Result<u64, InternalError>;

    /// Read and delete in one step
    async fn take(&self, key: &str) -> Result<Option<Value>, InternalError> {
        let Some(value) = self.get(key).await? else {
            return Ok(None);
        };
        // Only the caller whose delete succeeded may use the value
        if self.delete(key).await? {
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }
}

/// Process-local state store with lazy expiry
///
/// Not shared between worker processes; development only.
#[derive(Default)]
pub struct InMemoryStateStore {
    entries: Mutex<HashMap<String, (Value, Instant)>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (Value, Instant)>>, InternalError> {
        self.entries
            .lock()
            .map_err(|_| InternalError::parse("state_store", "state map lock poisoned"))
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), InternalError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        // Opportunistic cleanup on writes keeps the map bounded
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, InternalError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, InternalError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn cleanup_expired(&self) -> Result<u64, InternalError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }

    async fn take(&self, key: &str) -> Result<Option<Value>, InternalError> {
        let mut entries = self.lock()?;
        match entries.remove(key) {
            Some((value, expires_at)) if expires_at > Instant::now() => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}

/// State store on the application database
///
/// Entries live in `oauth_states` with a millisecond expiry, so any worker
/// process sharing the database can validate a state another one issued.
pub struct DatabaseStateStore {
    db: DatabaseConnection,
}

impl DatabaseStateStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StateStore for DatabaseStateStore {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), InternalError> {
        // Opportunistic cleanup on writes, as the in-memory store does
        if let Err(err) = self.cleanup_expired().await {
            tracing::warn!("Could not purge expired OAuth states: {}", err);
        }

        let expires_at = Utc::now().timestamp_millis() + ttl.as_millis() as i64;
        let model = ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            expires_at: Set(expires_at),
        };

        OAuthState::insert(model)
            .on_conflict(
                OnConflict::column(oauth_state::Column::Key)
                    .update_columns([oauth_state::Column::Value, oauth_state::Column::ExpiresAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("set_oauth_state", e))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, InternalError> {
        let entry = OAuthState::find_by_id(key.to_string())
            .filter(oauth_state::Column::ExpiresAt.gt(Utc::now().timestamp_millis()))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("get_oauth_state", e))?;

        match entry {
            Some(entry) => serde_json::from_str(&entry.value)
                .map(Some)
                .map_err(|e| InternalError::parse("oauth_state", e.to_string())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, InternalError> {
        let result = OAuthState::delete_by_id(key.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("delete_oauth_state", e))?;

        Ok(result.rows_affected > 0)
    }

    async fn cleanup_expired(&self) -> Result<u64, InternalError> {
        let result = OAuthState::delete_many()
            .filter(oauth_state::Column::ExpiresAt.lte(Utc::now().timestamp_millis()))
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("cleanup_oauth_states", e))?;

        if result.rows_affected > 0 {
            tracing::debug!("Removed {} expired OAuth states", result.rows_affected);
        }

        Ok(result.rows_affected)
    }
}

impl std::fmt::Debug for DatabaseStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseStateStore").field("db", &"<connection>").finish()
    }
}
