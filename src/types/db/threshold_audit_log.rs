use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AuditAction {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "published")]
    Published,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Published => "published",
        }
    }
}

/// Append-only record of a mutating threshold operation
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "threshold_audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub config_id: i32,
    pub action: AuditAction,
    pub operator_user_id: Option<String>,
    /// Snapshot of the configuration that was active when the action happened
    #[sea_orm(column_type = "Text", nullable)]
    pub old_config: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub new_config: String,
    #[sea_orm(indexed)]
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::threshold_config::Entity",
        from = "Column::ConfigId",
        to = "super::threshold_config::Column::Id"
    )]
    ThresholdConfig,
}

impl Related<super::threshold_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ThresholdConfig.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
