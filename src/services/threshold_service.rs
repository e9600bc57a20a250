use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde_json::Value;

use crate::errors::InternalError;
use crate::errors::internal::ThresholdConfigError;
use crate::services::retry::RetryPolicy;
use crate::services::{classifier, threshold_validator};
use crate::stores::threshold_store::{decode_values, to_record};
use crate::stores::{CredentialStore, HealthRecordStore, ThresholdStore};
use crate::types::db::threshold_audit_log::{self, AuditAction};
use crate::types::db::threshold_config::ThresholdStatus;
use crate::types::internal::threshold::{
    ActiveThreshold, AuditLogEntry, AuditLogPage, ImpactPreview, Operator, ThresholdRecord, ThresholdValues,
};

/// Readings considered by an impact preview
const PREVIEW_SAMPLE_SIZE: u64 = 1000;

/// Upper bound on rows in an audit export
pub const EXPORT_LIMIT: u64 = 10_000;

/// Threshold configuration governance: drafts, publishing, preview and audit
///
/// Every write runs in one transaction together with its audit row, and the
/// whole unit is retried on transient storage failures.
pub struct ThresholdService {
    db: DatabaseConnection,
    store: ThresholdStore,
    health_records: HealthRecordStore,
    credential_store: Arc<CredentialStore>,
    retry: RetryPolicy,
}

impl ThresholdService {
    pub fn new(db: DatabaseConnection, credential_store: Arc<CredentialStore>) -> Self {
        Self {
            db,
            store: ThresholdStore::new(),
            health_records: HealthRecordStore::new(),
            credential_store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validate a raw configuration and store it as the next draft
    pub async fn create_draft(&self, config: &Value, user_id: &str) -> Result<ThresholdRecord, InternalError> {
        let values = threshold_validator::validate(config).map_err(ThresholdConfigError::Validation)?;
        self.create_draft_values(&values, user_id).await
    }

    /// Store an already validated configuration as the next draft
    pub async fn create_draft_values(
        &self,
        values: &ThresholdValues,
        user_id: &str,
    ) -> Result<ThresholdRecord, InternalError> {
        let record = self
            .retry
            .run("create_draft", || self.insert_draft(values, user_id))
            .await?;

        tracing::info!(
            "Threshold draft {} (version {}) created by {}",
            record.id,
            record.version,
            user_id
        );
        Ok(record)
    }

    async fn insert_draft(&self, values: &ThresholdValues, user_id: &str) -> Result<ThresholdRecord, InternalError> {
        let txn = self.db.begin().await.map_err(InternalError::transaction_begin)?;

        let version = self.store.max_version(&txn).await?.unwrap_or(0) + 1;
        let model = self
            .store
            .insert_config(&txn, values, version, ThresholdStatus::Draft, Some(user_id), None)
            .await?;
        self.store
            .insert_audit(&txn, model.id, AuditAction::Created, Some(user_id), None, model.config.clone())
            .await?;

        txn.commit().await.map_err(InternalError::transaction_commit)?;
        to_record(model)
    }

    /// Make a draft the single active configuration
    pub async fn publish(&self, config_id: i32, user_id: &str) -> Result<ThresholdRecord, InternalError> {
        let record = self
            .retry
            .run("publish_threshold", || self.publish_once(config_id, user_id))
            .await?;

        tracing::info!(
            "Threshold config {} (version {}) published by {}",
            record.id,
            record.version,
            user_id
        );
        Ok(record)
    }

    async fn publish_once(&self, config_id: i32, user_id: &str) -> Result<ThresholdRecord, InternalError> {
        let txn = self.db.begin().await.map_err(InternalError::transaction_begin)?;

        let target = self
            .store
            .find_by_id(&txn, config_id)
            .await?
            .ok_or(ThresholdConfigError::NotFound(config_id))?;

        if target.status != ThresholdStatus::Draft {
            return Err(ThresholdConfigError::InvalidState {
                config_id,
                status: target.status.as_str().to_string(),
            }
            .into());
        }

        let previous = self.store.find_active(&txn).await?.map(|m| m.config);

        // Demote every active row, not just one, so a broken invariant heals
        let demoted = self.store.deactivate_all_active(&txn).await?;
        if demoted > 1 {
            tracing::warn!("Found {} active threshold configs while publishing {}", demoted, config_id);
        }

        let published = self.store.mark_active(&txn, target, Utc::now().timestamp()).await?;
        self.store
            .insert_audit(
                &txn,
                published.id,
                AuditAction::Published,
                Some(user_id),
                previous,
                published.config.clone(),
            )
            .await?;

        txn.commit().await.map_err(InternalError::transaction_commit)?;
        to_record(published)
    }

    /// The configuration in effect, falling back to the built-in default
    pub async fn get_active(&self) -> Result<ActiveThreshold, InternalError> {
        match self.store.find_active(&self.db).await? {
            Some(model) => Ok(ActiveThreshold {
                id: Some(model.id),
                config: decode_values(&model.config)?,
                version: model.version,
                published_at: model.published_at,
            }),
            None => Ok(ActiveThreshold {
                id: None,
                config: ThresholdValues::DEFAULT,
                version: 0,
                published_at: None,
            }),
        }
    }

    /// The highest-version draft, if any
    pub async fn get_draft(&self) -> Result<Option<ThresholdRecord>, InternalError> {
        self.store.find_latest_draft(&self.db).await?.map(to_record).transpose()
    }

    /// Classify recent readings against a candidate configuration
    pub async fn preview_impact(&self, config: &Value) -> Result<ImpactPreview, InternalError> {
        let values = threshold_validator::validate(config).map_err(ThresholdConfigError::Validation)?;
        self.preview_impact_values(&values).await
    }

    pub async fn preview_impact_values(&self, values: &ThresholdValues) -> Result<ImpactPreview, InternalError> {
        let records = self.health_records.recent(&self.db, PREVIEW_SAMPLE_SIZE).await?;
        Ok(classifier::summarize(&records, values))
    }

    /// One page of audit entries, newest first
    ///
    /// `page` is 1-based.
    pub async fn get_audit_logs(&self, page: u64, size: u64) -> Result<AuditLogPage, InternalError> {
        let total = self.store.count_audit_logs(&self.db).await?;
        let offset = page.saturating_sub(1).saturating_mul(size);
        let rows = self.store.list_audit_logs(&self.db, offset, size).await?;

        Ok(AuditLogPage {
            total,
            entries: self.enrich(rows).await?,
        })
    }

    /// Audit entries for CSV export, newest first and capped at EXPORT_LIMIT
    pub async fn export_audit_logs(&self) -> Result<Vec<AuditLogEntry>, InternalError> {
        let rows = self.store.list_audit_logs(&self.db, 0, EXPORT_LIMIT).await?;
        self.enrich(rows).await
    }

    async fn enrich(&self, rows: Vec<threshold_audit_log::Model>) -> Result<Vec<AuditLogEntry>, InternalError> {
        let mut entries = Vec::with_capacity(rows.len());

        for row in rows {
            let operator = match row.operator_user_id.as_deref() {
                Some(user_id) => match self.credential_store.find_by_id(&self.db, user_id).await? {
                    Some(user) => Operator {
                        id: Some(user.id),
                        username: user.username,
                        email: Some(user.email),
                    },
                    None => Operator::unknown(),
                },
                None => Operator::unknown(),
            };

            entries.push(AuditLogEntry {
                id: row.id,
                config_id: row.config_id,
                action: row.action.as_str().to_string(),
                operator,
                old_config: row.old_config.as_deref().map(parse_snapshot).transpose()?,
                new_config: parse_snapshot(&row.new_config)?,
                created_at: row.created_at,
            });
        }

        Ok(entries)
    }

    /// Make sure an active configuration exists
    ///
    /// Returns the existing active record untouched, or creates and publishes
    /// the default in a single step with one `created` audit entry.
    pub async fn ensure_default_config(&self, user_id: Option<&str>) -> Result<ThresholdRecord, InternalError> {
        self.retry
            .run("ensure_default_config", || self.ensure_default_once(user_id))
            .await
    }

    async fn ensure_default_once(&self, user_id: Option<&str>) -> Result<ThresholdRecord, InternalError> {
        let txn = self.db.begin().await.map_err(InternalError::transaction_begin)?;

        if let Some(active) = self.store.find_active(&txn).await? {
            txn.commit().await.map_err(InternalError::transaction_commit)?;
            return to_record(active);
        }

        // Drafts may already hold low versions, so never hard-code 1
        let version = self.store.max_version(&txn).await?.unwrap_or(0) + 1;
        let model = self
            .store
            .insert_config(
                &txn,
                &ThresholdValues::DEFAULT,
                version,
                ThresholdStatus::Active,
                user_id,
                Some(Utc::now().timestamp()),
            )
            .await?;
        self.store
            .insert_audit(&txn, model.id, AuditAction::Created, user_id, None, model.config.clone())
            .await?;

        txn.commit().await.map_err(InternalError::transaction_commit)?;
        tracing::info!("Default threshold config installed as version {}", model.version);
        to_record(model)
    }

    /// Stage the built-in default as a new draft
    pub async fn reset_to_default(&self, user_id: &str) -> Result<ThresholdRecord, InternalError> {
        self.create_draft_values(&ThresholdValues::DEFAULT, user_id).await
    }
}

fn parse_snapshot(raw: &str) -> Result<Value, InternalError> {
    serde_json::from_str(raw).map_err(|e| InternalError::parse("threshold_audit_snapshot", e.to_string()))
}

impl std::fmt::Debug for ThresholdService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThresholdService")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::{create_test_user, setup_test_db};
    use crate::types::internal::auth::Role;
    use serde_json::json;

    async fn setup() -> (DatabaseConnection, ThresholdService, String) {
        let db = setup_test_db().await;
        let credential_store = Arc::new(CredentialStore::new("test-pepper-for-unit-tests".to_string()));
        let admin = create_test_user(&db, &credential_store, "root@example.com", Role::SuperAdmin).await;
        let service = ThresholdService::new(db.clone(), credential_store);
        (db, service, admin.id)
    }

    fn config(systolic_max: i32) -> Value {
        let mut value = ThresholdValues::DEFAULT.to_json();
        value["systolic_max"] = json!(systolic_max);
        value
    }

    #[tokio::test]
    async fn test_create_draft_assigns_increasing_versions() {
        let (_db, service, admin) = setup().await;

        let first = service.create_draft(&config(130), &admin).await.unwrap();
        let second = service.create_draft(&config(135), &admin).await.unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(first.status, "draft");
        assert_eq!(service.get_draft().await.unwrap().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_create_draft_rejects_invalid_config() {
        let (_db, service, admin) = setup().await;

        let result = service.create_draft(&json!({"systolic_min": 90}), &admin).await;
        match result {
            Err(InternalError::ThresholdConfig(ThresholdConfigError::Validation(details))) => {
                assert_eq!(details.len(), 5);
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
        assert!(service.get_draft().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_active_defaults_when_nothing_published() {
        let (_db, service, _admin) = setup().await;

        let active = service.get_active().await.unwrap();
        assert_eq!(active.id, None);
        assert_eq!(active.version, 0);
        assert_eq!(active.config, ThresholdValues::DEFAULT);
        assert_eq!(active.published_at, None);
    }

    #[tokio::test]
    async fn test_publish_switches_active_config() {
        let (_db, service, admin) = setup().await;

        let first = service.create_draft(&config(130), &admin).await.unwrap();
        service.publish(first.id, &admin).await.unwrap();

        let second = service.create_draft(&config(140), &admin).await.unwrap();
        let published = service.publish(second.id, &admin).await.unwrap();
        assert_eq!(published.status, "active");
        assert!(published.published_at.is_some());

        let active = service.get_active().await.unwrap();
        assert_eq!(active.id, Some(second.id));
        assert_eq!(active.config.systolic_max, 140);

        // Versions keep climbing after publishes
        let third = service.create_draft(&config(150), &admin).await.unwrap();
        assert_eq!(third.version, 3);
    }

    #[tokio::test]
    async fn test_publish_records_previous_active_snapshot() {
        let (_db, service, admin) = setup().await;

        let first = service.create_draft(&config(130), &admin).await.unwrap();
        service.publish(first.id, &admin).await.unwrap();
        let second = service.create_draft(&config(140), &admin).await.unwrap();
        service.publish(second.id, &admin).await.unwrap();

        let page = service.get_audit_logs(1, 20).await.unwrap();
        assert_eq!(page.total, 4);

        let latest = &page.entries[0];
        assert_eq!(latest.action, "published");
        assert_eq!(latest.config_id, second.id);
        assert_eq!(latest.old_config.as_ref().unwrap()["systolic_max"], json!(130));
        assert_eq!(latest.new_config["systolic_max"], json!(140));
        assert_eq!(latest.operator.username, "root");
    }

    #[tokio::test]
    async fn test_publish_missing_config_is_not_found() {
        let (_db, service, admin) = setup().await;

        match service.publish(999, &admin).await {
            Err(InternalError::ThresholdConfig(ThresholdConfigError::NotFound(999))) => {}
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_twice_is_invalid_state() {
        let (_db, service, admin) = setup().await;

        let draft = service.create_draft(&config(130), &admin).await.unwrap();
        service.publish(draft.id, &admin).await.unwrap();

        match service.publish(draft.id, &admin).await {
            Err(InternalError::ThresholdConfig(ThresholdConfigError::InvalidState { status, .. })) => {
                assert_eq!(status, "active");
            }
            other => panic!("Expected InvalidState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ensure_default_config_is_idempotent() {
        let (_db, service, admin) = setup().await;

        let first = service.ensure_default_config(Some(&admin)).await.unwrap();
        let second = service.ensure_default_config(Some(&admin)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.version, 1);
        assert_eq!(first.status, "active");
        assert_eq!(first.config, ThresholdValues::DEFAULT);

        let page = service.get_audit_logs(1, 20).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.entries[0].action, "created");
    }

    #[tokio::test]
    async fn test_ensure_default_config_after_drafts_takes_next_version() {
        let (_db, service, admin) = setup().await;

        service.create_draft(&config(130), &admin).await.unwrap();
        let active = service.ensure_default_config(Some(&admin)).await.unwrap();

        assert_eq!(active.version, 2);
    }

    #[tokio::test]
    async fn test_reset_to_default_creates_draft() {
        let (_db, service, admin) = setup().await;

        let draft = service.reset_to_default(&admin).await.unwrap();
        assert_eq!(draft.status, "draft");
        assert_eq!(draft.config, ThresholdValues::DEFAULT);
    }

    #[tokio::test]
    async fn test_audit_log_pagination_and_unknown_operator() {
        let (_db, service, _admin) = setup().await;

        for max in [130, 131, 132] {
            service.create_draft(&config(max), "deleted-user").await.unwrap();
        }

        let page = service.get_audit_logs(2, 2).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].operator, Operator::unknown());
        assert_eq!(page.entries[0].new_config["systolic_max"], json!(130));
    }

    #[tokio::test]
    async fn test_preview_impact_over_recent_readings() {
        let (db, service, admin) = setup().await;
        let records = HealthRecordStore::new();
        for (systolic, at) in [(100, 1), (125, 2), (150, 3)] {
            records.insert(&db, &admin, systolic, 70, Some(75), at).await.unwrap();
        }

        let preview = service.preview_impact(&ThresholdValues::DEFAULT.to_json()).await.unwrap();
        assert_eq!(preview.total, 3);
        assert_eq!((preview.healthy, preview.borderline, preview.abnormal), (1, 1, 1));
    }
}
