use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::errors::InternalError;
use crate::types::db::threshold_audit_log::{self, AuditAction, Entity as ThresholdAuditLog};
use crate::types::db::threshold_config::{self, Entity as ThresholdConfig, ThresholdStatus};
use crate::types::internal::threshold::{ThresholdRecord, ThresholdValues};

/// Data access for versioned threshold configurations and their audit trail
///
/// Every method takes the connection or transaction to run on.
#[derive(Debug, Default)]
pub struct ThresholdStore;

/// Decode the JSON stored in a config or audit column
pub fn decode_values(raw: &str) -> Result<ThresholdValues, InternalError> {
    serde_json::from_str(raw).map_err(|e| InternalError::parse("threshold_config", e.to_string()))
}

pub fn encode_values(values: &ThresholdValues) -> Result<String, InternalError> {
    serde_json::to_string(values).map_err(|e| InternalError::parse("threshold_config", e.to_string()))
}

/// Decode a stored model into its domain record
pub fn to_record(model: threshold_config::Model) -> Result<ThresholdRecord, InternalError> {
    Ok(ThresholdRecord {
        id: model.id,
        config: decode_values(&model.config)?,
        version: model.version,
        status: model.status.as_str().to_string(),
        created_by: model.created_by,
        created_at: model.created_at,
        published_at: model.published_at,
    })
}

impl ThresholdStore {
    pub fn new() -> Self {
        Self
    }

    /// Highest version across every record regardless of status
    pub async fn max_version(&self, conn: &impl ConnectionTrait) -> Result<Option<i32>, InternalError> {
        let latest = ThresholdConfig::find()
            .order_by_desc(threshold_config::Column::Version)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("max_threshold_version", e))?;

        Ok(latest.map(|m| m.version))
    }

    pub async fn insert_config(
        &self,
        conn: &impl ConnectionTrait,
        values: &ThresholdValues,
        version: i32,
        status: ThresholdStatus,
        created_by: Option<&str>,
        published_at: Option<i64>,
    ) -> Result<threshold_config::Model, InternalError> {
        let model = threshold_config::ActiveModel {
            config: Set(encode_values(values)?),
            version: Set(version),
            status: Set(status),
            created_by: Set(created_by.map(str::to_string)),
            created_at: Set(Utc::now().timestamp()),
            published_at: Set(published_at),
            ..Default::default()
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_threshold_config", e))
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        config_id: i32,
    ) -> Result<Option<threshold_config::Model>, InternalError> {
        ThresholdConfig::find_by_id(config_id)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_threshold_config", e))
    }

    /// The active record; newest version wins if several are marked active
    pub async fn find_active(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Option<threshold_config::Model>, InternalError> {
        ThresholdConfig::find()
            .filter(threshold_config::Column::Status.eq(ThresholdStatus::Active))
            .order_by_desc(threshold_config::Column::Version)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_active_threshold", e))
    }

    /// Highest-version draft
    pub async fn find_latest_draft(
        &self,
        conn: &impl ConnectionTrait,
    ) -> Result<Option<threshold_config::Model>, InternalError> {
        ThresholdConfig::find()
            .filter(threshold_config::Column::Status.eq(ThresholdStatus::Draft))
            .order_by_desc(threshold_config::Column::Version)
            .one(conn)
            .await
            .map_err(|e| InternalError::database("find_latest_draft", e))
    }

    /// Demote every active record to inactive
    pub async fn deactivate_all_active(&self, conn: &impl ConnectionTrait) -> Result<u64, InternalError> {
        let result = ThresholdConfig::update_many()
            .col_expr(threshold_config::Column::Status, Expr::value(ThresholdStatus::Inactive.as_str()))
            .filter(threshold_config::Column::Status.eq(ThresholdStatus::Active))
            .exec(conn)
            .await
            .map_err(|e| InternalError::database("deactivate_active_thresholds", e))?;

        Ok(result.rows_affected)
    }

    pub async fn mark_active(
        &self,
        conn: &impl ConnectionTrait,
        model: threshold_config::Model,
        published_at: i64,
    ) -> Result<threshold_config::Model, InternalError> {
        let mut active = model.into_active_model();
        active.status = Set(ThresholdStatus::Active);
        active.published_at = Set(Some(published_at));

        active
            .update(conn)
            .await
            .map_err(|e| InternalError::database("publish_threshold_config", e))
    }

    pub async fn insert_audit(
        &self,
        conn: &impl ConnectionTrait,
        config_id: i32,
        action: AuditAction,
        operator_user_id: Option<&str>,
        old_config: Option<String>,
        new_config: String,
    ) -> Result<threshold_audit_log::Model, InternalError> {
        let model = threshold_audit_log::ActiveModel {
            config_id: Set(config_id),
            action: Set(action),
            operator_user_id: Set(operator_user_id.map(str::to_string)),
            old_config: Set(old_config),
            new_config: Set(new_config),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_threshold_audit", e))
    }

    pub async fn count_audit_logs(&self, conn: &impl ConnectionTrait) -> Result<u64, InternalError> {
        ThresholdAuditLog::find()
            .count(conn)
            .await
            .map_err(|e| InternalError::database("count_threshold_audit", e))
    }

    /// Audit rows newest first; ties on created_at fall back to insertion order
    pub async fn list_audit_logs(
        &self,
        conn: &impl ConnectionTrait,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<threshold_audit_log::Model>, InternalError> {
        ThresholdAuditLog::find()
            .order_by_desc(threshold_audit_log::Column::CreatedAt)
            .order_by_desc(threshold_audit_log::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("list_threshold_audit", e))
    }
}
