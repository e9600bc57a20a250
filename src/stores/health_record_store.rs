use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, QuerySelect, Set};

use crate::errors::InternalError;
use crate::types::db::health_record::{self, Entity as HealthRecord};

/// Read access to historical health readings
#[derive(Debug, Default)]
pub struct HealthRecordStore;

impl HealthRecordStore {
    pub fn new() -> Self {
        Self
    }

    /// Most recent readings first
    pub async fn recent(
        &self,
        conn: &impl ConnectionTrait,
        limit: u64,
    ) -> Result<Vec<health_record::Model>, InternalError> {
        HealthRecord::find()
            .order_by_desc(health_record::Column::RecordedAt)
            .order_by_desc(health_record::Column::Id)
            .limit(limit)
            .all(conn)
            .await
            .map_err(|e| InternalError::database("recent_health_records", e))
    }

    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        user_id: &str,
        systolic: i32,
        diastolic: i32,
        heart_rate: Option<i32>,
        recorded_at: i64,
    ) -> Result<health_record::Model, InternalError> {
        let model = health_record::ActiveModel {
            user_id: Set(user_id.to_string()),
            systolic: Set(systolic),
            diastolic: Set(diastolic),
            heart_rate: Set(heart_rate),
            recorded_at: Set(recorded_at),
            ..Default::default()
        };

        model
            .insert(conn)
            .await
            .map_err(|e| InternalError::database("insert_health_record", e))
    }
}
