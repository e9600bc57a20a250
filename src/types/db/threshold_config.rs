use sea_orm::entity::prelude::*;

/// Lifecycle of a threshold configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ThresholdStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl ThresholdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdStatus::Draft => "draft",
            ThresholdStatus::Active => "active",
            ThresholdStatus::Inactive => "inactive",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "threshold_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// JSON encoded ThresholdValues
    #[sea_orm(column_type = "Text")]
    pub config: String,
    #[sea_orm(unique)]
    pub version: i32,
    pub status: ThresholdStatus,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub published_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::threshold_audit_log::Entity")]
    AuditLog,
}

impl Related<super::threshold_audit_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
